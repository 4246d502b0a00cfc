use super::{ensure_box_caches, CachedBox, Error, JavaValue, LayoutErrorKind};
use crate::jvm::class_graph::{ClassData, FieldData};
use crate::jvm::{JavaKind, Name, RefType, RenderDescriptor, RenderJavaName};
use crate::util::RefId;
use elsa::FrozenVec;
use std::cell::{Ref, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use typed_arena::Arena;

/// Object whose allocation was removed by escape analysis
///
/// The values are laid out in the order of the instance fields of the type (see
/// `ClassData::instance_fields`), except that a `long` or `double` can be stored across two
/// consecutive `int` fields (see `verify_layout`). For arrays, there is one value per element.
///
/// Values are set after construction (they may refer to other virtual objects, including this
/// one) and may be replaced any number of times until the debug info is finalized.
pub struct VirtualObject<'g> {
    object_type: RefType<&'g ClassData<'g>>,
    base_object: RefCell<Option<JavaValue<'g>>>,
    slots: RefCell<Option<Slots<'g>>>,
    id: u32,
    is_auto_box: bool,
}

struct Slots<'g> {
    values: Vec<JavaValue<'g>>,
    kinds: Vec<JavaKind>,
}

/// Source of the field layout used to check the values of a virtual object
pub trait LayoutVerifier<'g> {
    /// Offset of the field in instances
    fn offset(&self, field: &'g FieldData<'g>) -> i32;

    /// Kind with which the field is actually stored, if it has been specialized
    fn storage_kind(&self, field: &'g FieldData<'g>) -> JavaKind {
        field.kind()
    }
}

impl<'g, F> LayoutVerifier<'g> for F
where
    F: Fn(&'g FieldData<'g>) -> i32,
{
    fn offset(&self, field: &'g FieldData<'g>) -> i32 {
        self(field)
    }
}

impl<'g> VirtualObject<'g> {
    /// Virtual object that will be freshly allocated
    ///
    /// Creating an auto-box object makes sure the box caches are populated, since
    /// materializing it may need to return a cached box.
    pub fn new(object_type: RefType<&'g ClassData<'g>>, id: u32, is_auto_box: bool) -> Self {
        if is_auto_box {
            ensure_box_caches();
        }
        VirtualObject {
            object_type,
            base_object: RefCell::new(None),
            slots: RefCell::new(None),
            id,
            is_auto_box,
        }
    }

    /// Virtual object that will reuse an existing object instead of allocating
    pub fn with_base_object(
        object_type: RefType<&'g ClassData<'g>>,
        base_object: JavaValue<'g>,
        id: u32,
        is_auto_box: bool,
    ) -> Self {
        let object = VirtualObject::new(object_type, id, is_auto_box);
        object.set_base_object(base_object);
        object
    }

    /// Unique id of the object within one debug info position
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn object_type(&self) -> &RefType<&'g ClassData<'g>> {
        &self.object_type
    }

    /// Existing object to reuse, if any
    pub fn base_object(&self) -> Option<JavaValue<'g>> {
        self.base_object.borrow().clone()
    }

    pub fn set_base_object(&self, base_object: JavaValue<'g>) {
        *self.base_object.borrow_mut() = Some(base_object);
    }

    pub fn is_auto_box(&self) -> bool {
        self.is_auto_box
    }

    /// Values, or `None` if they have not been set yet
    pub fn values(&self) -> Option<Ref<'_, [JavaValue<'g>]>> {
        Ref::filter_map(self.slots.borrow(), |slots| {
            slots.as_ref().map(|slots| slots.values.as_slice())
        })
        .ok()
    }

    /// Kind of the value at an index
    pub fn slot_kind(&self, index: usize) -> Option<JavaKind> {
        self.slots
            .borrow()
            .as_ref()
            .and_then(|slots| slots.kinds.get(index).copied())
    }

    /// Replace the values and their kinds
    pub fn set_values(
        &self,
        values: Vec<JavaValue<'g>>,
        slot_kinds: Vec<JavaKind>,
    ) -> Result<(), Error> {
        if values.len() != slot_kinds.len() {
            return Err(Error::ValueCountMismatch {
                values: values.len(),
                slot_kinds: slot_kinds.len(),
            });
        }
        *self.slots.borrow_mut() = Some(Slots {
            values,
            kinds: slot_kinds,
        });
        Ok(())
    }

    /// Overwrite one value in place (eg. after register allocation moved it)
    pub fn set_value(&self, index: usize, value: JavaValue<'g>) -> Result<(), Error> {
        let mut slots = self.slots.borrow_mut();
        let slot_count = slots.as_ref().map_or(0, |slots| slots.values.len());
        match slots
            .as_mut()
            .and_then(|slots| slots.values.get_mut(index))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::NoSuchSlot {
                index,
                slots: slot_count,
            }),
        }
    }

    /// Cached box that materializing this object must produce, if any
    ///
    /// This applies to auto-box objects of a box class whose value falls in the range of that
    /// box class's cache.
    pub fn cached_box(&self) -> Option<&'static CachedBox> {
        if !self.is_auto_box {
            return None;
        }
        let boxed_kind = match &self.object_type {
            RefType::Object(class) => JavaKind::from_box_class(&class.name)?,
            _ => return None,
        };
        let value = self.values()?.first()?.as_primitive()?;
        if value.kind() != boxed_kind {
            return None;
        }
        ensure_box_caches().lookup(&value)
    }

    /// Check that the values line up with the field layout of the type
    ///
    /// Arrays are not checked. For instances, every value must have the kind of its field, and
    /// every field must get a value. The exception is a double-word value (`long` or `double`)
    /// at an `int` field: that value is stored across the field and the next one. This requires
    /// the first to be 8-byte aligned and the second to be an `int` immediately after it.
    pub fn verify_layout<V>(&self, verifier: &V) -> Result<(), Error>
    where
        V: LayoutVerifier<'g> + ?Sized,
    {
        let class = match &self.object_type {
            RefType::Object(class) => *class,
            _ => return Ok(()),
        };
        self.check_layout(class, verifier).map_err(|kind| Error::Layout {
            object: self.to_string(),
            kind,
        })
    }

    fn check_layout<V>(
        &self,
        class: &'g ClassData<'g>,
        verifier: &V,
    ) -> Result<(), LayoutErrorKind>
    where
        V: LayoutVerifier<'g> + ?Sized,
    {
        let slots = self.slots.borrow();
        let slots = slots.as_ref().ok_or(LayoutErrorKind::ValuesNotSet)?;
        let fields = class.instance_fields();

        let mut field_index = 0;
        for slot_kind in &slots.kinds {
            let field = *fields
                .get(field_index)
                .ok_or(LayoutErrorKind::FieldCountMismatch)?;
            let field_kind = verifier.storage_kind(field);

            if slot_kind.slot_count() == 2 && field_kind == JavaKind::Int {
                let offset = verifier.offset(field);
                if offset % 8 != 0 {
                    return Err(LayoutErrorKind::MisalignedSplitValue { offset });
                }
                let field2 = *fields
                    .get(field_index + 1)
                    .ok_or(LayoutErrorKind::MissingSecondSplitField)?;
                let field2_kind = verifier.storage_kind(field2);
                if field2_kind != JavaKind::Int {
                    return Err(LayoutErrorKind::IncompatibleSplitFieldKind { found: field2_kind });
                }
                let offset2 = verifier.offset(field2);
                if offset + 4 != offset2 {
                    return Err(LayoutErrorKind::NonSequentialSplitFields {
                        first: offset,
                        second: offset2,
                    });
                }
                field_index += 2;
            } else if field_kind.stack_kind() != slot_kind.stack_kind() {
                return Err(LayoutErrorKind::KindMismatch {
                    field: format!("{:?}", field),
                    expected: field_kind,
                    found: *slot_kind,
                });
            } else {
                field_index += 1;
            }
        }

        if field_index < fields.len() {
            return Err(LayoutErrorKind::NotEnoughValues);
        }
        Ok(())
    }

    /// Render the object, with `visited` tracking which objects have already been expanded
    fn write<'a>(
        &'a self,
        f: &mut fmt::Formatter<'_>,
        visited: &mut HashSet<RefId<'a, VirtualObject<'g>>>,
    ) -> fmt::Result {
        write!(f, "vobject:{}:{}", self.object_type.java_name(), self.id)?;
        if !visited.insert(RefId(self)) {
            return Ok(());
        }
        if self.is_auto_box {
            f.write_str("[auto_box]")?;
        }
        f.write_str("{")?;

        let slots = self.slots.borrow();
        match (slots.as_ref(), &self.object_type) {
            (None, _) => f.write_str("<uninitialized>")?,
            (Some(slots), RefType::Object(class)) => {
                let fields = class.instance_fields();
                let mut field_index = 0;
                for (i, (value, kind)) in slots.values.iter().zip(&slots.kinds).enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    match fields.get(field_index) {
                        None => f.write_str("<missing field>")?,
                        Some(field) => {
                            f.write_str(field.name.as_str())?;
                            if kind.slot_count() == 2 && field.kind().slot_count() == 1 {
                                field_index += 1;
                                match fields.get(field_index) {
                                    None => f.write_str("/<missing field>")?,
                                    Some(field2) => write!(f, "/{}", field2.name.as_str())?,
                                }
                            }
                        }
                    }
                    f.write_str("=")?;
                    write_value(value, f, visited)?;
                    field_index += 1;
                }
                for (i, field) in fields.iter().enumerate().skip(field_index) {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}=<missing value>", field.name.as_str())?;
                }
            }
            (Some(slots), _) => {
                for (i, value) in slots.values.iter().enumerate() {
                    if i != 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}=", i)?;
                    write_value(value, f, visited)?;
                }
            }
        }

        f.write_str("}")
    }
}

fn write_value<'a, 'g: 'a>(
    value: &JavaValue<'g>,
    f: &mut fmt::Formatter<'_>,
    visited: &mut HashSet<RefId<'a, VirtualObject<'g>>>,
) -> fmt::Result {
    match value {
        JavaValue::Virtual(object) => object.write(f, visited),
        other => fmt::Display::fmt(other, f),
    }
}

/// Rendering expands every reachable virtual object once; later occurrences only show the
/// `vobject:<type>:<id>` tag, so cycles are fine.
impl<'g> fmt::Display for VirtualObject<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut visited = HashSet::new();
        self.write(f, &mut visited)
    }
}

impl<'g> fmt::Debug for VirtualObject<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Two virtual objects are equal if they have the same type (the very same class, not just the
/// same name) and their values are pairwise the same. Values that are virtual objects must be the very same object (see `JavaValue`'s
/// equality), so this never recurses.
impl<'g> PartialEq for VirtualObject<'g> {
    fn eq(&self, other: &VirtualObject<'g>) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if !same_type(&self.object_type, &other.object_type) {
            return false;
        }
        let slots1 = self.slots.borrow();
        let slots2 = other.slots.borrow();
        match (slots1.as_ref(), slots2.as_ref()) {
            (Some(slots1), Some(slots2)) => slots1.values == slots2.values,
            (None, None) => true,
            _ => false,
        }
    }
}

impl<'g> Eq for VirtualObject<'g> {}

/// Type equality by class identity, since a redefined class has the same name as the old one
fn same_type<'g>(
    type1: &RefType<&'g ClassData<'g>>,
    type2: &RefType<&'g ClassData<'g>>,
) -> bool {
    match (type1, type2) {
        (RefType::Object(class1), RefType::Object(class2)) => std::ptr::eq(*class1, *class2),
        (RefType::ObjectArray(array1), RefType::ObjectArray(array2)) => {
            array1.additional_dimensions == array2.additional_dimensions
                && std::ptr::eq(array1.element_type, array2.element_type)
        }
        (RefType::PrimitiveArray(array1), RefType::PrimitiveArray(array2)) => array1 == array2,
        _ => false,
    }
}

/// Only the type is hashed, since the values can change after insertion in a map
impl<'g> Hash for VirtualObject<'g> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        42u32.hash(state);
        self.object_type.render().hash(state);
    }
}

/// Arena owning the virtual objects of one debug info position
///
/// Ids must be unique within an arena.
pub struct VirtualObjectArena<'g> {
    arena: Arena<VirtualObject<'g>>,
    objects: FrozenVec<RefId<'g, VirtualObject<'g>>>,
}

impl<'g> VirtualObjectArena<'g> {
    pub fn new() -> Self {
        VirtualObjectArena {
            arena: Arena::new(),
            objects: FrozenVec::new(),
        }
    }

    pub fn add(&'g self, object: VirtualObject<'g>) -> Result<&'g VirtualObject<'g>, Error> {
        if self.get(object.id).is_some() {
            return Err(Error::DuplicateId(object.id));
        }
        let object = &*self.arena.alloc(object);
        self.objects.push(RefId(object));
        Ok(object)
    }

    /// Look up a virtual object by id
    pub fn get(&'g self, id: u32) -> Option<&'g VirtualObject<'g>> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Virtual objects in the order they were added
    pub fn iter(&'g self) -> impl Iterator<Item = &'g VirtualObject<'g>> {
        self.objects.iter()
    }

    /// Check the layout of every virtual object in the arena
    pub fn verify_layouts<V>(&'g self, verifier: &V) -> Result<(), Error>
    where
        V: LayoutVerifier<'g> + ?Sized,
    {
        self.iter()
            .try_for_each(|object| object.verify_layout(verifier))
    }
}

impl<'g> Default for VirtualObjectArena<'g> {
    fn default() -> Self {
        VirtualObjectArena::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::code::PrimitiveConstant;
    use crate::jvm::class_graph::{ClassGraph, ClassGraphArenas};
    use crate::jvm::{
        BaseType, BinaryName, ClassAccessFlags, FieldAccessFlags, FieldType, UnqualifiedName,
    };

    fn add_int_field<'g>(graph: &ClassGraph<'g>, class: &'g ClassData<'g>, name: &str) {
        graph.add_field(FieldData {
            class,
            name: UnqualifiedName::from_string(name.to_owned()).unwrap(),
            descriptor: FieldType::int(),
            access_flags: FieldAccessFlags::PRIVATE,
        });
    }

    fn layout_error_kind<'g>(
        object: &VirtualObject<'g>,
        verifier: &impl LayoutVerifier<'g>,
    ) -> Option<LayoutErrorKind> {
        match object.verify_layout(verifier) {
            Err(Error::Layout { kind, .. }) => Some(kind),
            _ => None,
        }
    }

    #[test]
    fn set_values_requires_matching_lengths() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();

        let object = VirtualObject::new(RefType::Object(java.classes.lang.object), 0, false);
        assert!(object.values().is_none());
        assert!(matches!(
            object.set_values(vec![JavaValue::Null], vec![]),
            Err(Error::ValueCountMismatch {
                values: 1,
                slot_kinds: 0
            })
        ));
        assert!(matches!(
            object.set_value(0, JavaValue::Null),
            Err(Error::NoSuchSlot { index: 0, slots: 0 })
        ));

        object
            .set_values(vec![JavaValue::Null], vec![JavaKind::Object])
            .unwrap();
        object
            .set_value(0, PrimitiveConstant::int(1).into())
            .unwrap();
        assert_eq!(
            object.values().unwrap().to_vec(),
            vec![JavaValue::Primitive(PrimitiveConstant::int(1))]
        );
        assert_eq!(object.slot_kind(0), Some(JavaKind::Object));
        assert_eq!(object.slot_kind(1), None);
    }

    #[test]
    fn rendering_missing_fields_and_values() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();

        let pair = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("a/Pair")).unwrap(),
            java.classes.lang.object,
            ClassAccessFlags::PUBLIC,
        ));
        add_int_field(&graph, pair, "lo");
        add_int_field(&graph, pair, "hi");
        add_int_field(&graph, pair, "extra");

        let object = VirtualObject::new(RefType::Object(pair), 7, false);
        assert_eq!(object.to_string(), "vobject:a.Pair:7{<uninitialized>}");

        object
            .set_values(
                vec![PrimitiveConstant::long(1).into()],
                vec![JavaKind::Long],
            )
            .unwrap();
        assert_eq!(
            object.to_string(),
            "vobject:a.Pair:7{lo/hi=long[1],extra=<missing value>}"
        );

        object
            .set_values(
                vec![JavaValue::Null, JavaValue::Null, JavaValue::Null, JavaValue::Null],
                vec![JavaKind::Object; 4],
            )
            .unwrap();
        assert_eq!(
            object.to_string(),
            "vobject:a.Pair:7{lo=null,hi=null,extra=null,<missing field>=null}"
        );

        let ints = VirtualObject::new(
            RefType::array(FieldType::Base(BaseType::Int)),
            8,
            false,
        );
        ints.set_values(
            vec![PrimitiveConstant::int(3).into(), JavaValue::Illegal],
            vec![JavaKind::Int, JavaKind::Int],
        )
        .unwrap();
        assert_eq!(ints.to_string(), "vobject:int[]:8{0=int[3],1=-}");
    }

    #[test]
    fn kind_mismatch_and_field_counts() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();

        let point = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("a/Point")).unwrap(),
            java.classes.lang.object,
            ClassAccessFlags::PUBLIC,
        ));
        add_int_field(&graph, point, "x");
        add_int_field(&graph, point, "y");
        let offsets = |field: &FieldData| if field.name.as_str() == "x" { 12 } else { 16 };

        let object = VirtualObject::new(RefType::Object(point), 1, false);
        assert_eq!(layout_error_kind(&object, &offsets), Some(LayoutErrorKind::ValuesNotSet));

        // `short` values go in `int` fields just fine
        let short = JavaValue::from(PrimitiveConstant::short(1));
        object
            .set_values(vec![short.clone(), short.clone()], vec![JavaKind::Short; 2])
            .unwrap();
        assert_eq!(layout_error_kind(&object, &offsets), None);

        object
            .set_values(vec![short.clone(), JavaValue::Null], vec![JavaKind::Int, JavaKind::Object])
            .unwrap();
        assert!(matches!(
            layout_error_kind(&object, &offsets),
            Some(LayoutErrorKind::KindMismatch {
                expected: JavaKind::Int,
                found: JavaKind::Object,
                ..
            })
        ));

        object
            .set_values(vec![short.clone()], vec![JavaKind::Int])
            .unwrap();
        assert_eq!(layout_error_kind(&object, &offsets), Some(LayoutErrorKind::NotEnoughValues));

        object
            .set_values(vec![short.clone(); 3], vec![JavaKind::Int; 3])
            .unwrap();
        assert_eq!(layout_error_kind(&object, &offsets), Some(LayoutErrorKind::FieldCountMismatch));
    }

    #[test]
    fn arena_ids_are_unique() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();
        let object_type = RefType::Object(java.classes.lang.object);

        let objects = VirtualObjectArena::new();
        let first = objects.add(VirtualObject::new(object_type, 0, false)).unwrap();
        objects.add(VirtualObject::new(object_type, 1, false)).unwrap();
        assert!(matches!(
            objects.add(VirtualObject::new(object_type, 0, false)),
            Err(Error::DuplicateId(0))
        ));
        assert_eq!(objects.len(), 2);
        assert!(std::ptr::eq(objects.get(0).unwrap(), first));
        assert!(objects.get(2).is_none());
    }
}
