use super::{
    BinaryName, ClassAccessFlags, Error, FieldAccessFlags, FieldType, JavaKind,
    MethodAccessFlags, MethodDescriptor, Name, RefType, RenderDescriptor, RenderJavaName,
    UnqualifiedName,
};
use elsa::FrozenVec;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use typed_arena::Arena;

mod java_classes;
mod java_lib_types;
mod java_members;

pub use java_classes::*;
pub use java_lib_types::*;
pub use java_members::*;

pub struct ClassGraphArenas<'g> {
    class_arena: Arena<ClassData<'g>>,
    method_arena: Arena<MethodData<'g>>,
    field_arena: Arena<FieldData<'g>>,
}

impl<'g> ClassGraphArenas<'g> {
    pub fn new() -> Self {
        ClassGraphArenas {
            class_arena: Arena::new(),
            method_arena: Arena::new(),
            field_arena: Arena::new(),
        }
    }
}

impl<'g> Default for ClassGraphArenas<'g> {
    fn default() -> Self {
        ClassGraphArenas::new()
    }
}

/// Tracks the relationships between classes/interfaces and the members on those classes
///
/// This is the compiler's view of the loaded types: it is what signatures in metadata attributes
/// resolve against and what gives virtual objects their field layout. Everything allocated into
/// the graph lives as long as the arenas, so classes can freely point at each other (and at their
/// own members).
pub struct ClassGraph<'g> {
    arenas: &'g ClassGraphArenas<'g>,
    classes: RefCell<HashMap<BinaryName, &'g ClassData<'g>>>,
}

impl<'g> ClassGraph<'g> {
    /// New empty graph
    pub fn new(arenas: &'g ClassGraphArenas<'g>) -> Self {
        ClassGraph {
            arenas,
            classes: RefCell::new(HashMap::new()),
        }
    }

    pub fn lookup_class(&self, name: &BinaryName) -> Option<&'g ClassData<'g>> {
        self.classes.borrow().get(name).copied()
    }

    /// Add a new class to the class graph
    ///
    /// A class added under a name that is already taken shadows the previous class for lookups
    /// (this is how a redefined class shows up).
    pub fn add_class(&self, data: ClassData<'g>) -> &'g ClassData<'g> {
        let data = &*self.arenas.class_arena.alloc(data);
        let previous = self.classes.borrow_mut().insert(data.name.clone(), data);
        if previous.is_some() {
            log::debug!("Class {:?} redefined", data.name);
        }
        data
    }

    /// Add a field to the class graph and to its class
    pub fn add_field(&self, field: FieldData<'g>) -> &'g FieldData<'g> {
        let data = &*self.arenas.field_arena.alloc(field);
        data.class.fields.push(data);
        data
    }

    /// Add a method to the class graph and to its class
    ///
    /// If the class already has a method with the same name and descriptor, that is returned.
    pub fn add_method(&self, method: MethodData<'g>) -> &'g MethodData<'g> {
        if let Some(m) = method.class.methods.iter().find(|m| {
            m.name == method.name
                && m.descriptor == method.descriptor
                && m.is_static() == method.is_static()
        }) {
            m
        } else {
            let data = &*self.arenas.method_arena.alloc(method);
            data.class.methods.push(data);
            data
        }
    }

    /// Turn a field type naming classes into one pointing at classes in the graph
    pub fn resolve_field_type(
        &self,
        field_type: &FieldType<BinaryName>,
    ) -> Result<FieldType<&'g ClassData<'g>>, Error> {
        field_type.try_map(|name| {
            self.lookup_class(name)
                .ok_or_else(|| Error::MissingClass(name.as_str().to_owned()))
        })
    }

    /// Same as `resolve_field_type`, but for reference types
    pub fn resolve_ref_type(
        &self,
        ref_type: &RefType<BinaryName>,
    ) -> Result<RefType<&'g ClassData<'g>>, Error> {
        ref_type.try_map(|name| {
            self.lookup_class(name)
                .ok_or_else(|| Error::MissingClass(name.as_str().to_owned()))
        })
    }

    /// Add standard types to the class graph
    pub fn insert_java_library_types(&self) -> JavaLibrary<'g> {
        JavaLibrary::add_to_graph(self)
    }
}

pub struct ClassData<'g> {
    /// Name of the class
    pub name: BinaryName,

    /// Superclass is only ever missing for `java/lang/Object` itself
    pub superclass: Option<&'g ClassData<'g>>,

    /// Interfaces implemented (or super-interfaces)
    pub interfaces: FrozenVec<&'g ClassData<'g>>,

    pub access_flags: ClassAccessFlags,

    /// Methods
    pub methods: FrozenVec<&'g MethodData<'g>>,

    /// Fields, in declaration order
    pub fields: FrozenVec<&'g FieldData<'g>>,
}

impl<'g> ClassData<'g> {
    pub fn new(
        name: BinaryName,
        superclass: &'g ClassData<'g>,
        access_flags: ClassAccessFlags,
    ) -> ClassData<'g> {
        ClassData {
            name,
            superclass: Some(superclass),
            interfaces: FrozenVec::new(),
            access_flags,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(ClassAccessFlags::INTERFACE)
    }

    /// Every non-static field of an instance of this class
    ///
    /// Fields of superclasses come first. Within one class, fields are in declaration order. This
    /// is the order in which the values of a virtual object are laid out.
    pub fn instance_fields(&'g self) -> Vec<&'g FieldData<'g>> {
        let mut hierarchy: Vec<&'g ClassData<'g>> = vec![];
        let mut next_class = Some(self);
        while let Some(class) = next_class {
            hierarchy.push(class);
            next_class = class.superclass;
        }

        hierarchy
            .into_iter()
            .rev()
            .flat_map(|class| class.fields.iter())
            .filter(|field| !field.is_static())
            .collect()
    }

    /// Can this class currently be used as an annotation interface?
    ///
    /// It must be flagged as an annotation interface and all of its abstract methods must look
    /// like annotation elements (no parameters, non-`void` return). A class whose definition
    /// stopped meeting these conditions (eg. it was redefined into a plain interface) is not a
    /// valid annotation.
    pub fn is_valid_annotation(&'g self) -> bool {
        let flags = ClassAccessFlags::INTERFACE | ClassAccessFlags::ANNOTATION;
        self.access_flags.contains(flags)
            && self
                .methods
                .iter()
                .filter(|method| method.is_abstract())
                .all(|method| {
                    method.descriptor.parameters.is_empty()
                        && method.descriptor.return_type.is_some()
                })
    }

    /// Element of an annotation interface with the given name
    pub fn annotation_element(&'g self, name: &UnqualifiedName) -> Option<&'g MethodData<'g>> {
        self.methods
            .iter()
            .find(|method| &method.name == name && method.is_abstract() && !method.is_static())
    }
}

impl<'g> PartialEq for ClassData<'g> {
    fn eq(&self, other: &ClassData<'g>) -> bool {
        self.name == other.name
    }
}

impl<'g> Eq for ClassData<'g> {}

impl<'g> RenderDescriptor for ClassData<'g> {
    fn render_to(&self, write_to: &mut String) {
        self.name.render_to(write_to)
    }
}

impl<'a, 'g> RenderDescriptor for &'a ClassData<'g> {
    fn render_to(&self, write_to: &mut String) {
        self.name.render_to(write_to)
    }
}

impl<'g> RenderJavaName for ClassData<'g> {
    fn java_name_to(&self, write_to: &mut String) {
        self.name.java_name_to(write_to)
    }
}

impl<'a, 'g> RenderJavaName for &'a ClassData<'g> {
    fn java_name_to(&self, write_to: &mut String) {
        self.name.java_name_to(write_to)
    }
}

impl<'g> Debug for ClassData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}

#[derive(PartialEq)]
pub struct MethodData<'g> {
    /// Class
    pub class: &'g ClassData<'g>,

    /// Name of the method
    pub name: UnqualifiedName,

    /// Type of the method
    pub descriptor: MethodDescriptor<&'g ClassData<'g>>,

    pub access_flags: MethodAccessFlags,

    /// Default value, if this is an annotation element declaring one
    pub annotation_default: Option<ConstantData<'g>>,
}

impl<'g> MethodData<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }
}

impl<'g> Debug for MethodData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}

#[derive(PartialEq, Eq)]
pub struct FieldData<'g> {
    /// Class
    ///
    /// Note: this is a pointer back to the class (so don't derive `Debug`)
    pub class: &'g ClassData<'g>,

    /// Name of the field
    pub name: UnqualifiedName,

    /// Type of the field
    pub descriptor: FieldType<&'g ClassData<'g>>,

    pub access_flags: FieldAccessFlags,
}

impl<'g> FieldData<'g> {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(FieldAccessFlags::STATIC)
    }

    /// Declared kind of the field
    pub fn kind(&self) -> JavaKind {
        JavaKind::from(&self.descriptor)
    }
}

impl<'g> Debug for FieldData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "{}.{}:{}",
            self.class.name.as_str(),
            self.name.as_str(),
            self.descriptor.render(),
        ))
    }
}

/// Constant value known to the compiler
#[derive(PartialEq, Clone)]
pub enum ConstantData<'g> {
    String(Cow<'static, str>),
    Class(RefType<&'g ClassData<'g>>),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl<'g> Debug for ConstantData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantData::String(string) => string.fmt(f),
            ConstantData::Class(ref_type) => ref_type.fmt(f),
            ConstantData::Integer(integer) => integer.fmt(f),
            ConstantData::Long(long) => long.fmt(f),
            ConstantData::Float(float) => float.fmt(f),
            ConstantData::Double(double) => double.fmt(f),
        }
    }
}

/// Constants are displayed the way they would be written in Java source
impl<'g> fmt::Display for ConstantData<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantData::String(string) => write!(f, "{:?}", string),
            ConstantData::Class(ref_type) => write!(f, "{}.class", ref_type.java_name()),
            ConstantData::Integer(integer) => write!(f, "{}", integer),
            ConstantData::Long(long) => write!(f, "{}L", long),
            ConstantData::Float(float) => write!(f, "{:?}f", float),
            ConstantData::Double(double) => write!(f, "{:?}", double),
        }
    }
}
