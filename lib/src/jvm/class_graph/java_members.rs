use super::{FieldAccessFlags, FieldData, FieldType, JavaClasses, UnqualifiedName};
use super::{ClassData, ClassGraph};

/// Members of classes inside `java.*`
pub struct JavaMembers<'g> {
    pub lang: LangMembers<'g>,
}

/// Members of classes inside `java.lang.*`
pub struct LangMembers<'g> {
    pub boolean: BoxMembers<'g>,
    pub byte: BoxMembers<'g>,
    pub short: BoxMembers<'g>,
    pub character: BoxMembers<'g>,
    pub integer: BoxMembers<'g>,
    pub long: BoxMembers<'g>,
    pub float: BoxMembers<'g>,
    pub double: BoxMembers<'g>,
}

/// Members of the primitive box classes (`java.lang.Integer` and friends)
pub struct BoxMembers<'g> {
    /// The boxed primitive (`private final <primitive> value`)
    pub value: &'g FieldData<'g>,
}

impl<'g> JavaMembers<'g> {
    pub fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        classes: &JavaClasses<'g>,
    ) -> JavaMembers<'g> {
        let lang = &classes.lang;
        JavaMembers {
            lang: LangMembers {
                boolean: BoxMembers::add_to_graph(class_graph, lang.boolean, FieldType::boolean()),
                byte: BoxMembers::add_to_graph(class_graph, lang.byte, FieldType::byte()),
                short: BoxMembers::add_to_graph(class_graph, lang.short, FieldType::short()),
                character: BoxMembers::add_to_graph(class_graph, lang.character, FieldType::char()),
                integer: BoxMembers::add_to_graph(class_graph, lang.integer, FieldType::int()),
                long: BoxMembers::add_to_graph(class_graph, lang.long, FieldType::long()),
                float: BoxMembers::add_to_graph(class_graph, lang.float, FieldType::float()),
                double: BoxMembers::add_to_graph(class_graph, lang.double, FieldType::double()),
            },
        }
    }
}

impl<'g> BoxMembers<'g> {
    fn add_to_graph(
        class_graph: &ClassGraph<'g>,
        class: &'g ClassData<'g>,
        descriptor: FieldType<&'g ClassData<'g>>,
    ) -> BoxMembers<'g> {
        let value = class_graph.add_field(FieldData {
            class,
            name: UnqualifiedName::VALUE,
            descriptor,
            access_flags: FieldAccessFlags::PRIVATE | FieldAccessFlags::FINAL,
        });
        BoxMembers { value }
    }
}
