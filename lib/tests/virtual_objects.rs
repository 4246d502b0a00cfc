use jvmci::code::*;
use jvmci::jvm::class_graph::*;
use jvmci::jvm::{
    BinaryName, ClassAccessFlags, FieldAccessFlags, FieldType, JavaKind, Name, RefType,
    UnqualifiedName,
};
use std::collections::HashMap;

type Descriptor<'g> = FieldType<&'g ClassData<'g>>;

fn add_class<'g>(
    graph: &ClassGraph<'g>,
    java: &JavaLibrary<'g>,
    name: &str,
    fields: &[(&str, Descriptor<'g>)],
) -> &'g ClassData<'g> {
    let class = graph.add_class(ClassData::new(
        BinaryName::from_string(name.to_owned()).unwrap(),
        java.classes.lang.object,
        ClassAccessFlags::PUBLIC,
    ));
    for (field, descriptor) in fields {
        graph.add_field(FieldData {
            class,
            name: UnqualifiedName::from_string((*field).to_owned()).unwrap(),
            descriptor: *descriptor,
            access_flags: FieldAccessFlags::PRIVATE,
        });
    }
    class
}

/// Field layout given by name, with optional specialized storage kinds
struct FieldLayout {
    offsets: HashMap<&'static str, i32>,
    storage_kinds: HashMap<&'static str, JavaKind>,
}

impl FieldLayout {
    fn new(offsets: &[(&'static str, i32)]) -> FieldLayout {
        FieldLayout {
            offsets: offsets.iter().copied().collect(),
            storage_kinds: HashMap::new(),
        }
    }
}

impl<'g> LayoutVerifier<'g> for FieldLayout {
    fn offset(&self, field: &'g FieldData<'g>) -> i32 {
        self.offsets[field.name.as_str()]
    }

    fn storage_kind(&self, field: &'g FieldData<'g>) -> JavaKind {
        self.storage_kinds
            .get(field.name.as_str())
            .copied()
            .unwrap_or_else(|| field.kind())
    }
}

fn layout_error(result: Result<(), Error>) -> Option<LayoutErrorKind> {
    match result {
        Ok(()) => None,
        Err(Error::Layout { kind, .. }) => Some(kind),
        Err(other) => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn split_long_across_int_fields() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let class = add_class(
        &graph,
        &java,
        "me/alec/Split",
        &[("a", FieldType::int()), ("b", FieldType::int())],
    );

    let objects = VirtualObjectArena::new();
    let object = objects
        .add(VirtualObject::new(RefType::Object(class), 0, false))
        .unwrap();
    object
        .set_values(vec![PrimitiveConstant::long(-1).into()], vec![JavaKind::Long])
        .unwrap();

    let adjacent = FieldLayout::new(&[("a", 8), ("b", 12)]);
    assert_eq!(layout_error(object.verify_layout(&adjacent)), None);
    assert_eq!(layout_error(objects.verify_layouts(&adjacent)), None);

    let gap = FieldLayout::new(&[("a", 8), ("b", 16)]);
    assert_eq!(
        layout_error(object.verify_layout(&gap)),
        Some(LayoutErrorKind::NonSequentialSplitFields {
            first: 8,
            second: 16
        })
    );

    let misaligned = FieldLayout::new(&[("a", 6), ("b", 10)]);
    assert_eq!(
        layout_error(object.verify_layout(&misaligned)),
        Some(LayoutErrorKind::MisalignedSplitValue { offset: 6 })
    );

    let mut specialized = FieldLayout::new(&[("a", 8), ("b", 12)]);
    specialized.storage_kinds.insert("b", JavaKind::Float);
    assert_eq!(
        layout_error(object.verify_layout(&specialized)),
        Some(LayoutErrorKind::IncompatibleSplitFieldKind {
            found: JavaKind::Float
        })
    );

    // A closure giving offsets is a verifier too
    let offsets = |field: &FieldData| if field.name.as_str() == "a" { 16 } else { 20 };
    assert_eq!(layout_error(object.verify_layout(&offsets)), None);

    let err = object.verify_layout(&gap).unwrap_err();
    assert!(err.to_string().ends_with(" in vobject:me.alec.Split:0{a/b=long[-1]}"));
}

#[test]
fn split_needs_a_second_field() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let class = add_class(&graph, &java, "me/alec/Lonely", &[("a", FieldType::int())]);

    let object = VirtualObject::new(RefType::Object(class), 0, false);
    object
        .set_values(vec![PrimitiveConstant::double(1.5).into()], vec![JavaKind::Double])
        .unwrap();
    assert_eq!(
        layout_error(object.verify_layout(&FieldLayout::new(&[("a", 16)]))),
        Some(LayoutErrorKind::MissingSecondSplitField)
    );
}

#[test]
fn arrays_are_not_checked() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();

    let strings = VirtualObject::new(
        RefType::array(FieldType::object(java.classes.lang.string)),
        3,
        false,
    );
    strings
        .set_values(vec![PrimitiveConstant::int(1).into()], vec![JavaKind::Int])
        .unwrap();
    assert_eq!(
        layout_error(strings.verify_layout(&FieldLayout::new(&[]))),
        None
    );
    assert_eq!(
        strings.to_string(),
        "vobject:java.lang.String[]:3{0=int[1]}"
    );
}

#[test]
fn self_reference() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let class = add_class(
        &graph,
        &java,
        "me/alec/Loop",
        &[("me", FieldType::object(java.classes.lang.object))],
    );

    let objects = VirtualObjectArena::new();
    let object = objects
        .add(VirtualObject::new(RefType::Object(class), 4, false))
        .unwrap();
    object
        .set_values(vec![object.into()], vec![JavaKind::Object])
        .unwrap();

    assert_eq!(
        object.to_string(),
        "vobject:me.alec.Loop:4{me=vobject:me.alec.Loop:4}"
    );
    assert_eq!(object, object);
    assert_eq!(objects.get(4).unwrap(), object);
}

#[test]
fn equality_is_shallow() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let object_type = RefType::Object(add_class(
        &graph,
        &java,
        "me/alec/Box",
        &[("value", FieldType::object(java.classes.lang.object))],
    ));

    let objects = VirtualObjectArena::new();
    let child1 = objects.add(VirtualObject::new(object_type, 0, false)).unwrap();
    let child2 = objects.add(VirtualObject::new(object_type, 1, false)).unwrap();
    for child in [child1, child2] {
        child
            .set_values(vec![JavaValue::Null], vec![JavaKind::Object])
            .unwrap();
    }
    // The children look the same, but are different objects
    assert_eq!(child1, child2);
    assert_ne!(JavaValue::from(child1), JavaValue::from(child2));
    assert!(std::ptr::eq(
        JavaValue::from(child1).as_virtual().unwrap(),
        child1
    ));

    let parent1 = objects.add(VirtualObject::new(object_type, 2, false)).unwrap();
    let parent2 = objects.add(VirtualObject::new(object_type, 3, false)).unwrap();
    let parent3 = objects.add(VirtualObject::new(object_type, 4, false)).unwrap();
    parent1
        .set_values(vec![child1.into()], vec![JavaKind::Object])
        .unwrap();
    parent2
        .set_values(vec![child1.into()], vec![JavaKind::Object])
        .unwrap();
    parent3
        .set_values(vec![child2.into()], vec![JavaKind::Object])
        .unwrap();

    assert_eq!(parent1, parent2);
    assert_ne!(parent1, parent3);

    // Objects with values never set only equal each other
    let empty1 = VirtualObject::new(object_type, 10, false);
    let empty2 = VirtualObject::new(object_type, 11, false);
    assert_eq!(empty1, empty2);
    assert_ne!(&empty1, child1);
}

#[test]
fn redefined_class_is_a_different_type() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let old = add_class(&graph, &java, "me/alec/Point", &[("x", FieldType::int())]);
    let new = add_class(&graph, &java, "me/alec/Point", &[("y", FieldType::long())]);
    let name = BinaryName::from_string(String::from("me/alec/Point")).unwrap();
    assert!(std::ptr::eq(graph.lookup_class(&name).unwrap(), new));

    let old_object = VirtualObject::new(RefType::Object(old), 0, false);
    let new_object = VirtualObject::new(RefType::Object(new), 1, false);
    for object in [&old_object, &new_object] {
        object
            .set_values(vec![JavaValue::Null], vec![JavaKind::Object])
            .unwrap();
    }
    assert_ne!(old_object, new_object);
    assert_eq!(old_object.to_string(), "vobject:me.alec.Point:0{x=null}");
    assert_eq!(new_object.to_string(), "vobject:me.alec.Point:1{y=null}");

    let old_array = VirtualObject::new(RefType::array(FieldType::object(old)), 2, false);
    let new_array = VirtualObject::new(RefType::array(FieldType::object(new)), 3, false);
    assert_ne!(old_array, new_array);
    assert_eq!(
        old_array,
        VirtualObject::new(RefType::array(FieldType::object(old)), 4, false)
    );
}

#[test]
fn base_objects() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let location = ValueLocation::Register {
        number: 2,
        kind: JavaKind::Object,
    };

    let object = VirtualObject::with_base_object(
        RefType::Object(java.classes.lang.object),
        JavaValue::Location(location),
        9,
        false,
    );
    assert_eq!(object.base_object(), Some(JavaValue::Location(location)));
    object.set_base_object(JavaValue::Null);
    assert_eq!(object.base_object(), Some(JavaValue::Null));
    assert!(!object.is_auto_box());
    assert_eq!(object.id(), 9);
}

#[test]
fn auto_box_cached_values() {
    let arenas = ClassGraphArenas::new();
    let graph = ClassGraph::new(&arenas);
    let java = graph.insert_java_library_types();
    let integer = RefType::Object(java.classes.lang.integer);

    let small = VirtualObject::new(integer, 0, true);
    assert!(box_caches_populated());
    assert!(small.cached_box().is_none());
    small
        .set_values(vec![PrimitiveConstant::int(100).into()], vec![JavaKind::Int])
        .unwrap();
    let cached = small.cached_box().unwrap();
    assert_eq!(cached.value(), PrimitiveConstant::int(100));
    assert!(std::ptr::eq(
        cached,
        ensure_box_caches()
            .lookup(&PrimitiveConstant::int(100))
            .unwrap()
    ));

    let large = VirtualObject::new(integer, 1, true);
    large
        .set_values(vec![PrimitiveConstant::int(1000).into()], vec![JavaKind::Int])
        .unwrap();
    assert!(large.cached_box().is_none());

    let not_auto_box = VirtualObject::new(integer, 2, false);
    not_auto_box
        .set_values(vec![PrimitiveConstant::int(1).into()], vec![JavaKind::Int])
        .unwrap();
    assert!(not_auto_box.cached_box().is_none());

    let double = VirtualObject::new(RefType::Object(java.classes.lang.double), 3, true);
    double
        .set_values(vec![PrimitiveConstant::double(1.0).into()], vec![JavaKind::Double])
        .unwrap();
    assert!(double.cached_box().is_none());
    assert_eq!(
        double.to_string(),
        "vobject:java.lang.Double:3[auto_box]{value=double[1.0]}"
    );
}
