use crate::jvm::class_graph::{ClassData, ConstantData};
use crate::jvm::{Name, RenderJavaName, UnqualifiedName};
use std::fmt;

/// Annotation on the type of a local variable, scoped to a range of bytecode
#[derive(Clone, PartialEq, Debug)]
pub struct LocalAnnotation<'g> {
    annotation: Option<Annotation<'g>>,
    start: u16,
    length: u16,
    index: u16,
}

impl<'g> LocalAnnotation<'g> {
    pub fn new(annotation: Option<Annotation<'g>>, start: u16, length: u16, index: u16) -> Self {
        LocalAnnotation {
            annotation,
            start,
            length,
            index,
        }
    }

    /// Decoded annotation
    ///
    /// This is `None` when the annotation type is not (or is no longer) an annotation interface.
    pub fn annotation(&self) -> Option<&Annotation<'g>> {
        self.annotation.as_ref()
    }

    /// Bytecode offset at which the local variable comes into scope
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Length of the bytecode range in which the local variable is in scope
    pub fn length(&self) -> u16 {
        self.length
    }

    /// Local variable slot
    pub fn index(&self) -> u16 {
        self.index
    }
}

impl<'g> fmt::Display for LocalAnnotation<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[local @ index {}]: ", self.index)?;
        match &self.annotation {
            Some(annotation) => fmt::Display::fmt(annotation, f),
            None => f.write_str("null"),
        }
    }
}

/// Instance of an annotation interface
#[derive(Clone, PartialEq)]
pub struct Annotation<'g> {
    annotation_type: &'g ClassData<'g>,
    element_values: Vec<(UnqualifiedName, ConstantData<'g>)>,
}

impl<'g> Annotation<'g> {
    pub fn new(
        annotation_type: &'g ClassData<'g>,
        element_values: Vec<(UnqualifiedName, ConstantData<'g>)>,
    ) -> Self {
        Annotation {
            annotation_type,
            element_values,
        }
    }

    pub fn annotation_type(&self) -> &'g ClassData<'g> {
        self.annotation_type
    }

    /// Values of the elements, in the order the annotation interface declares them
    pub fn element_values(&self) -> &[(UnqualifiedName, ConstantData<'g>)] {
        &self.element_values
    }

    pub fn element_value(&self, name: &str) -> Option<&ConstantData<'g>> {
        self.element_values
            .iter()
            .find(|(element, _)| element.as_str() == name)
            .map(|(_, value)| value)
    }
}

impl<'g> fmt::Debug for Annotation<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<'g> fmt::Display for Annotation<'g> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.annotation_type.java_name())?;
        for (i, (element, value)) in self.element_values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", element, value)?;
        }
        f.write_str(")")
    }
}
