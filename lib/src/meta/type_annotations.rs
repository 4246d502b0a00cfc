use super::element_value::{skip_element_value, skip_element_value_pairs};
use super::{Annotation, Error, LocalAnnotation};
use crate::jvm;
use crate::jvm::class_graph::{ClassData, ClassGraph};
use crate::jvm::{
    BinaryName, ConstantIndex, ConstantPool, FieldType, Name, ParseDescriptor, RefType,
    UnqualifiedName,
};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

/// `target_type` of a type annotation on a local variable
pub const LOCAL_VARIABLE: u8 = 0x40;

/// Resolves type signatures found in metadata into types of the class graph
pub trait TypeResolver<'g> {
    /// Resolve a field type signature as seen from inside `accessing_class`
    fn resolve_signature(
        &self,
        signature: &str,
        accessing_class: &'g ClassData<'g>,
    ) -> Result<FieldType<&'g ClassData<'g>>, jvm::Error>;
}

/// The class graph has a single namespace, so the accessing class does not matter
impl<'g> TypeResolver<'g> for ClassGraph<'g> {
    fn resolve_signature(
        &self,
        signature: &str,
        _accessing_class: &'g ClassData<'g>,
    ) -> Result<FieldType<&'g ClassData<'g>>, jvm::Error> {
        let field_type = FieldType::<BinaryName>::parse(signature)
            .map_err(|err| jvm::Error::BadDescriptor(format!("{}: {}", signature, err)))?;
        self.resolve_field_type(&field_type)
    }
}

/// Decode the type annotations of a method
///
/// The input is the body of a `RuntimeVisibleTypeAnnotations` attribute attached to a method's
/// `Code`. Every annotation must target a local variable. Of the local variable table entries
/// of an annotation, only the last one is kept. Type paths are skipped over.
///
/// Decoding is all or nothing: any error (including a valid element being named, since element
/// values are not decoded) fails the whole call. The one exception is an annotation type that
/// resolves to something other than an annotation interface. That produces a `LocalAnnotation`
/// with no annotation.
pub fn parse_type_annotations<'g, P, T>(
    bytes: &[u8],
    constant_pool: &P,
    resolver: &T,
    container: &'g ClassData<'g>,
) -> Result<Vec<LocalAnnotation<'g>>, Error>
where
    P: ConstantPool + ?Sized,
    T: TypeResolver<'g> + ?Sized,
{
    let mut reader = Cursor::new(bytes);
    let num_annotations = reader.read_u16::<BigEndian>()?;
    let mut annotations = Vec::with_capacity(num_annotations as usize);

    for _ in 0..num_annotations {
        let target_type = reader.read_u8()?;
        if target_type != LOCAL_VARIABLE {
            return Err(Error::UnsupportedTargetKind(target_type));
        }

        let (mut start, mut length, mut index) = (0, 0, 0);
        let table_length = reader.read_u16::<BigEndian>()?;
        for entry in 0..table_length {
            if entry > 0 {
                log::trace!(
                    "Dropping local variable range start={} length={} index={}",
                    start,
                    length,
                    index
                );
            }
            start = reader.read_u16::<BigEndian>()?;
            length = reader.read_u16::<BigEndian>()?;
            index = reader.read_u16::<BigEndian>()?;
        }

        let path_length = reader.read_u8()?;
        for _ in 0..path_length {
            let _type_path_kind = reader.read_u8()?;
            let _type_argument_index = reader.read_u8()?;
        }
        if path_length > 0 {
            log::trace!("Skipped type path of length {}", path_length);
        }

        let annotation = read_annotation(&mut reader, constant_pool, resolver, container)?;
        log::debug!(
            "Decoded local variable annotation at index {} ({}+{}): {:?}",
            index,
            start,
            length,
            annotation
        );
        annotations.push(LocalAnnotation::new(annotation, start, length, index));
    }

    Ok(annotations)
}

/// Read an `annotation` structure
///
/// Returns `None` if the type does not resolve to a valid annotation interface.
fn read_annotation<'g, P, T>(
    reader: &mut Cursor<&[u8]>,
    constant_pool: &P,
    resolver: &T,
    container: &'g ClassData<'g>,
) -> Result<Option<Annotation<'g>>, Error>
where
    P: ConstantPool + ?Sized,
    T: TypeResolver<'g> + ?Sized,
{
    let type_index = ConstantIndex(reader.read_u16::<BigEndian>()?);
    let signature = constant_pool.lookup_utf8(type_index)?;

    let annotation_type = match resolve_annotation_type(signature, resolver, container)? {
        Some(annotation_type) => annotation_type,
        None => {
            log::warn!(
                "Type {} is not an annotation interface, skipping annotation",
                signature
            );
            skip_element_value_pairs(reader)?;
            return Ok(None);
        }
    };

    let num_pairs = reader.read_u16::<BigEndian>()?;
    for _ in 0..num_pairs {
        let name_index = ConstantIndex(reader.read_u16::<BigEndian>()?);
        let name = constant_pool.lookup_utf8(name_index)?;
        let element = UnqualifiedName::from_string(name.to_owned())
            .ok()
            .and_then(|name| annotation_type.annotation_element(&name));

        match element {
            // Element is no longer present in the annotation interface
            None => {
                log::trace!(
                    "Skipping value of removed element {} on {:?}",
                    name,
                    annotation_type
                );
                skip_element_value(reader)?;
            }
            Some(element) => {
                return Err(Error::UnimplementedElementDecoding {
                    annotation: annotation_type.name.clone(),
                    element: element.name.clone(),
                })
            }
        }
    }

    let defaults = annotation_type
        .methods
        .iter()
        .filter(|method| method.is_abstract() && !method.is_static())
        .filter_map(|method| {
            let default = method.annotation_default.clone()?;
            Some((method.name.clone(), default))
        })
        .collect();
    Ok(Some(Annotation::new(annotation_type, defaults)))
}

/// Resolve the signature of an annotation, if it names an annotation interface
fn resolve_annotation_type<'g, T>(
    signature: &str,
    resolver: &T,
    container: &'g ClassData<'g>,
) -> Result<Option<&'g ClassData<'g>>, Error>
where
    T: TypeResolver<'g> + ?Sized,
{
    if signature == "V" {
        return Ok(None);
    }
    let resolved = resolver.resolve_signature(signature, container)?;
    Ok(match resolved {
        FieldType::Ref(RefType::Object(class)) if class.is_valid_annotation() => Some(class),
        _ => None,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::class_graph::{ClassGraphArenas, ConstantData, MethodData};
    use crate::jvm::{ClassAccessFlags, ConstantsPool, MethodAccessFlags, MethodDescriptor};

    #[test]
    fn class_graph_resolves_signatures() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();
        let object = java.classes.lang.object;

        assert_eq!(
            graph.resolve_signature("Ljava/lang/String;", object).unwrap(),
            FieldType::object(java.classes.lang.string)
        );
        assert!(matches!(
            graph.resolve_signature("Lno/Such;", object),
            Err(jvm::Error::MissingClass(_))
        ));
        assert!(matches!(
            graph.resolve_signature("java/lang/String", object),
            Err(jvm::Error::BadDescriptor(_))
        ));
    }

    #[test]
    fn defaults_fill_in_the_annotation() {
        let arenas = ClassGraphArenas::new();
        let graph = ClassGraph::new(&arenas);
        let java = graph.insert_java_library_types();
        let object = java.classes.lang.object;

        let range = graph.add_class(ClassData::new(
            BinaryName::from_string(String::from("me/alec/Range")).unwrap(),
            object,
            ClassAccessFlags::PUBLIC | ClassAccessFlags::ANNOTATION_INTERFACE,
        ));
        for (name, default) in [
            ("min", Some(ConstantData::Long(0))),
            ("max", None),
            ("unit", Some(ConstantData::String("ms".into()))),
        ] {
            graph.add_method(MethodData {
                class: range,
                name: UnqualifiedName::from_string(String::from(name)).unwrap(),
                descriptor: MethodDescriptor::getter(FieldType::long()),
                access_flags: MethodAccessFlags::ANNOTATION_ELEMENT,
                annotation_default: default,
            });
        }

        let mut pool = ConstantsPool::new();
        let sig = pool.get_utf8("Lme/alec/Range;").unwrap();
        let mut bytes = vec![0, 1, LOCAL_VARIABLE, 0, 1, 0, 2, 0, 9, 0, 4, 0];
        bytes.extend_from_slice(&(sig.0).0.to_be_bytes());
        bytes.extend_from_slice(&[0, 0]);

        let decoded = parse_type_annotations(&bytes, &pool, &graph, object).unwrap();
        let annotation = decoded[0].annotation().unwrap();
        assert_eq!(annotation.element_values().len(), 2);
        assert_eq!(annotation.element_value("min"), Some(&ConstantData::Long(0)));
        assert_eq!(annotation.element_value("max"), None);
        assert_eq!(
            decoded[0].to_string(),
            "[local @ index 4]: @me.alec.Range(min=0L, unit=\"ms\")"
        );
    }
}
