use super::{BinaryName, ClassAccessFlags, ClassData, ClassGraph};
use elsa::FrozenVec;

/// Classes inside `java.*`
pub struct JavaClasses<'g> {
    pub lang: LangClasses<'g>,
}

/// Classes inside `java.lang.*`
pub struct LangClasses<'g> {
    pub object: &'g ClassData<'g>,
    pub string: &'g ClassData<'g>,
    pub number: &'g ClassData<'g>,
    pub boolean: &'g ClassData<'g>,
    pub byte: &'g ClassData<'g>,
    pub short: &'g ClassData<'g>,
    pub character: &'g ClassData<'g>,
    pub integer: &'g ClassData<'g>,
    pub long: &'g ClassData<'g>,
    pub float: &'g ClassData<'g>,
    pub double: &'g ClassData<'g>,
    pub annotation: AnnotationClasses<'g>,
}

/// Classes inside `java.lang.annotation.*`
pub struct AnnotationClasses<'g> {
    pub annotation: &'g ClassData<'g>,
}

impl<'g> JavaClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> JavaClasses<'g> {
        let lang = LangClasses::add_to_graph(class_graph);
        JavaClasses { lang }
    }
}

impl<'g> LangClasses<'g> {
    pub fn add_to_graph(class_graph: &ClassGraph<'g>) -> LangClasses<'g> {
        let final_class =
            ClassAccessFlags::PUBLIC | ClassAccessFlags::FINAL | ClassAccessFlags::SUPER;

        let object = class_graph.add_class(ClassData {
            name: BinaryName::OBJECT,
            superclass: None,
            interfaces: FrozenVec::new(),
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            methods: FrozenVec::new(),
            fields: FrozenVec::new(),
        });
        let string = class_graph.add_class(ClassData::new(BinaryName::STRING, object, final_class));
        let number = class_graph.add_class(ClassData::new(
            BinaryName::NUMBER,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::ABSTRACT | ClassAccessFlags::SUPER,
        ));
        let boolean =
            class_graph.add_class(ClassData::new(BinaryName::BOOLEAN, object, final_class));
        let byte = class_graph.add_class(ClassData::new(BinaryName::BYTE, number, final_class));
        let short = class_graph.add_class(ClassData::new(BinaryName::SHORT, number, final_class));
        let character =
            class_graph.add_class(ClassData::new(BinaryName::CHARACTER, object, final_class));
        let integer =
            class_graph.add_class(ClassData::new(BinaryName::INTEGER, number, final_class));
        let long = class_graph.add_class(ClassData::new(BinaryName::LONG, number, final_class));
        let float = class_graph.add_class(ClassData::new(BinaryName::FLOAT, number, final_class));
        let double = class_graph.add_class(ClassData::new(BinaryName::DOUBLE, number, final_class));
        let annotation = AnnotationClasses::add_to_graph(class_graph, object);

        LangClasses {
            object,
            string,
            number,
            boolean,
            byte,
            short,
            character,
            integer,
            long,
            float,
            double,
            annotation,
        }
    }

    /// The eight primitive box classes
    pub fn box_classes(&self) -> [&'g ClassData<'g>; 8] {
        [
            self.boolean,
            self.byte,
            self.short,
            self.character,
            self.integer,
            self.long,
            self.float,
            self.double,
        ]
    }
}

impl<'g> AnnotationClasses<'g> {
    pub fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        object: &'g ClassData<'g>,
    ) -> AnnotationClasses<'g> {
        let annotation = class_graph.add_class(ClassData::new(
            BinaryName::ANNOTATION,
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE | ClassAccessFlags::ABSTRACT,
        ));
        AnnotationClasses { annotation }
    }
}
