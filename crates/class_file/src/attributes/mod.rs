use std::io::{Read, Write};

use crate::{
    record::{items_length, table_length},
    writer::u4_length,
    ConstantPool, Parser, Record, Result, Writer,
};

mod annotations;
mod class;
mod code;
mod debug;
mod module;
mod stack_map;

pub use annotations::{
    Annotation, ElementValue, ElementValuePair, LocalVarTarget, ParameterAnnotations,
    TargetInfo, TypeAnnotation, TypePath, TypePathEntry, TypePathKind,
};
pub use class::{BootstrapMethod, InnerClass, MethodParameter, RecordComponent};
pub use code::{CodeAttribute, ExceptionTableEntry};
pub use debug::{LineNumber, LocalVariable, LocalVariableType};
pub use module::{ModuleAttribute, ModuleExports, ModuleOpens, ModuleProvides, ModuleRequires};
pub use stack_map::{StackMapFrame, StackMapTable, VerificationType};

/// An ordered attribute collection, as owned by a class, a member, a Code
/// attribute or a record component.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attributes(pub Vec<Attribute>);
impl Attributes {
    pub fn find_by_name(&self, name: &str, constant_pool: &ConstantPool) -> Option<&Attribute> {
        let index = self.position_by_name(name, constant_pool)?;
        self.0.get(index)
    }

    pub fn find_by_name_mut(
        &mut self,
        name: &str,
        constant_pool: &ConstantPool,
    ) -> Option<&mut Attribute> {
        let index = self.position_by_name(name, constant_pool)?;
        self.0.get_mut(index)
    }

    fn position_by_name(&self, name: &str, constant_pool: &ConstantPool) -> Option<usize> {
        self.0.iter().position(|a| {
            constant_pool
                .utf8(a.attribute_name_index)
                .map_or(false, |s| s == name)
        })
    }

    pub fn code_attribute(&self) -> Option<&CodeAttribute> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn code_attribute_mut(&mut self) -> Option<&mut CodeAttribute> {
        self.0.iter_mut().find_map(|a| match &mut a.info {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
impl Record for Attributes {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        parser.parse_attributes(constant_pool)
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_table(&self.0, "attributes")
    }

    /// Encoded size including the `u2` count.
    fn byte_length(&self) -> u32 {
        table_length(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub attribute_name_index: u16,
    pub info: AttributeInfo,
}
impl Record for Attribute {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        parser.parse_attribute(constant_pool)
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_attribute(self)
    }

    /// Name index, length field and payload.
    fn byte_length(&self) -> u32 {
        6 + self.info.byte_length()
    }
}

/// The payload of an attribute, selected by the attribute's name.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeInfo {
    ConstantValue {
        constantvalue_index: u16,
    },
    Code(CodeAttribute),
    StackMapTable(StackMapTable),
    Exceptions {
        exception_index_table: Vec<u16>,
    },
    InnerClasses {
        classes: Vec<InnerClass>,
    },
    EnclosingMethod {
        class_index: u16,
        // zero when the class is not enclosed by a method or constructor
        method_index: u16,
    },
    Synthetic,
    Signature {
        signature_index: u16,
    },
    SourceFile {
        sourcefile_index: u16,
    },
    SourceDebugExtension {
        debug_extension: Vec<u8>,
    },
    LineNumberTable {
        line_number_table: Vec<LineNumber>,
    },
    LocalVariableTable {
        local_variable_table: Vec<LocalVariable>,
    },
    LocalVariableTypeTable {
        local_variable_type_table: Vec<LocalVariableType>,
    },
    Deprecated,
    RuntimeVisibleAnnotations {
        annotations: Vec<Annotation>,
    },
    RuntimeInvisibleAnnotations {
        annotations: Vec<Annotation>,
    },
    RuntimeVisibleParameterAnnotations {
        parameter_annotations: Vec<ParameterAnnotations>,
    },
    RuntimeInvisibleParameterAnnotations {
        parameter_annotations: Vec<ParameterAnnotations>,
    },
    RuntimeVisibleTypeAnnotations {
        annotations: Vec<TypeAnnotation>,
    },
    RuntimeInvisibleTypeAnnotations {
        annotations: Vec<TypeAnnotation>,
    },
    AnnotationDefault {
        default_value: ElementValue,
    },
    BootstrapMethods {
        bootstrap_methods: Vec<BootstrapMethod>,
    },
    MethodParameters {
        parameters: Vec<MethodParameter>,
    },
    Module(ModuleAttribute),
    ModulePackages {
        package_index: Vec<u16>,
    },
    ModuleMainClass {
        main_class_index: u16,
    },
    ModuleTarget {
        target_platform_index: u16,
    },
    NestHost {
        host_class_index: u16,
    },
    NestMembers {
        classes: Vec<u16>,
    },
    PermittedSubclasses {
        classes: Vec<u16>,
    },
    Record {
        components: Vec<RecordComponent>,
    },
    /// Any attribute without a decoder here, kept byte for byte.
    Unknown(Vec<u8>),
}
impl AttributeInfo {
    /// Decodes the payload of the attribute called `name`, or `None` when
    /// the name is not one this crate decodes.
    pub(crate) fn read_from<R: Read>(
        name: &str,
        parser: &mut Parser<R>,
        constant_pool: &ConstantPool,
    ) -> Option<Result<Self>> {
        let cp = constant_pool;
        Some(match name {
            "ConstantValue" => parser
                .read_u16()
                .map(|constantvalue_index| Self::ConstantValue {
                    constantvalue_index,
                }),
            "Code" => CodeAttribute::read_from(parser, cp).map(Self::Code),
            "StackMapTable" => StackMapTable::read_from(parser, cp).map(Self::StackMapTable),
            "Exceptions" => parser
                .read_index_table()
                .map(|exception_index_table| Self::Exceptions {
                    exception_index_table,
                }),
            "InnerClasses" => parser
                .read_table(cp)
                .map(|classes| Self::InnerClasses { classes }),
            "EnclosingMethod" => parser.read_u16().and_then(|class_index| {
                Ok(Self::EnclosingMethod {
                    class_index,
                    method_index: parser.read_u16()?,
                })
            }),
            "Synthetic" => Ok(Self::Synthetic),
            "Signature" => parser
                .read_u16()
                .map(|signature_index| Self::Signature { signature_index }),
            "SourceFile" => parser
                .read_u16()
                .map(|sourcefile_index| Self::SourceFile { sourcefile_index }),
            "SourceDebugExtension" => parser
                .read_remaining()
                .map(|debug_extension| Self::SourceDebugExtension { debug_extension }),
            "LineNumberTable" => parser
                .read_table(cp)
                .map(|line_number_table| Self::LineNumberTable { line_number_table }),
            "LocalVariableTable" => {
                parser
                    .read_table(cp)
                    .map(|local_variable_table| Self::LocalVariableTable {
                        local_variable_table,
                    })
            }
            "LocalVariableTypeTable" => {
                parser
                    .read_table(cp)
                    .map(|local_variable_type_table| Self::LocalVariableTypeTable {
                        local_variable_type_table,
                    })
            }
            "Deprecated" => Ok(Self::Deprecated),
            "RuntimeVisibleAnnotations" => parser
                .read_table(cp)
                .map(|annotations| Self::RuntimeVisibleAnnotations { annotations }),
            "RuntimeInvisibleAnnotations" => parser
                .read_table(cp)
                .map(|annotations| Self::RuntimeInvisibleAnnotations { annotations }),
            "RuntimeVisibleParameterAnnotations" => {
                parser.read_short_table(cp).map(|parameter_annotations| {
                    Self::RuntimeVisibleParameterAnnotations {
                        parameter_annotations,
                    }
                })
            }
            "RuntimeInvisibleParameterAnnotations" => {
                parser.read_short_table(cp).map(|parameter_annotations| {
                    Self::RuntimeInvisibleParameterAnnotations {
                        parameter_annotations,
                    }
                })
            }
            "RuntimeVisibleTypeAnnotations" => parser
                .read_table(cp)
                .map(|annotations| Self::RuntimeVisibleTypeAnnotations { annotations }),
            "RuntimeInvisibleTypeAnnotations" => parser
                .read_table(cp)
                .map(|annotations| Self::RuntimeInvisibleTypeAnnotations { annotations }),
            "AnnotationDefault" => ElementValue::read_from(parser, cp)
                .map(|default_value| Self::AnnotationDefault { default_value }),
            "BootstrapMethods" => parser
                .read_table(cp)
                .map(|bootstrap_methods| Self::BootstrapMethods { bootstrap_methods }),
            "MethodParameters" => parser
                .read_short_table(cp)
                .map(|parameters| Self::MethodParameters { parameters }),
            "Module" => ModuleAttribute::read_from(parser, cp).map(Self::Module),
            "ModulePackages" => parser
                .read_index_table()
                .map(|package_index| Self::ModulePackages { package_index }),
            "ModuleMainClass" => parser
                .read_u16()
                .map(|main_class_index| Self::ModuleMainClass { main_class_index }),
            "ModuleTarget" => parser
                .read_u16()
                .map(|target_platform_index| Self::ModuleTarget {
                    target_platform_index,
                }),
            "NestHost" => parser
                .read_u16()
                .map(|host_class_index| Self::NestHost { host_class_index }),
            "NestMembers" => parser
                .read_index_table()
                .map(|classes| Self::NestMembers { classes }),
            "PermittedSubclasses" => parser
                .read_index_table()
                .map(|classes| Self::PermittedSubclasses { classes }),
            "Record" => parser
                .read_table(cp)
                .map(|components| Self::Record { components }),
            _ => return None,
        })
    }

    /// The attribute name this payload is decoded from, `None` for
    /// [`AttributeInfo::Unknown`].
    pub fn name(&self) -> Option<&'static str> {
        Some(match self {
            Self::ConstantValue { .. } => "ConstantValue",
            Self::Code(_) => "Code",
            Self::StackMapTable(_) => "StackMapTable",
            Self::Exceptions { .. } => "Exceptions",
            Self::InnerClasses { .. } => "InnerClasses",
            Self::EnclosingMethod { .. } => "EnclosingMethod",
            Self::Synthetic => "Synthetic",
            Self::Signature { .. } => "Signature",
            Self::SourceFile { .. } => "SourceFile",
            Self::SourceDebugExtension { .. } => "SourceDebugExtension",
            Self::LineNumberTable { .. } => "LineNumberTable",
            Self::LocalVariableTable { .. } => "LocalVariableTable",
            Self::LocalVariableTypeTable { .. } => "LocalVariableTypeTable",
            Self::Deprecated => "Deprecated",
            Self::RuntimeVisibleAnnotations { .. } => "RuntimeVisibleAnnotations",
            Self::RuntimeInvisibleAnnotations { .. } => "RuntimeInvisibleAnnotations",
            Self::RuntimeVisibleParameterAnnotations { .. } => {
                "RuntimeVisibleParameterAnnotations"
            }
            Self::RuntimeInvisibleParameterAnnotations { .. } => {
                "RuntimeInvisibleParameterAnnotations"
            }
            Self::RuntimeVisibleTypeAnnotations { .. } => "RuntimeVisibleTypeAnnotations",
            Self::RuntimeInvisibleTypeAnnotations { .. } => "RuntimeInvisibleTypeAnnotations",
            Self::AnnotationDefault { .. } => "AnnotationDefault",
            Self::BootstrapMethods { .. } => "BootstrapMethods",
            Self::MethodParameters { .. } => "MethodParameters",
            Self::Module(_) => "Module",
            Self::ModulePackages { .. } => "ModulePackages",
            Self::ModuleMainClass { .. } => "ModuleMainClass",
            Self::ModuleTarget { .. } => "ModuleTarget",
            Self::NestHost { .. } => "NestHost",
            Self::NestMembers { .. } => "NestMembers",
            Self::PermittedSubclasses { .. } => "PermittedSubclasses",
            Self::Record { .. } => "Record",
            Self::Unknown(_) => return None,
        })
    }

    pub(crate) fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            Self::ConstantValue {
                constantvalue_index: index,
            }
            | Self::Signature {
                signature_index: index,
            }
            | Self::SourceFile {
                sourcefile_index: index,
            }
            | Self::ModuleMainClass {
                main_class_index: index,
            }
            | Self::ModuleTarget {
                target_platform_index: index,
            }
            | Self::NestHost {
                host_class_index: index,
            } => writer.write_u16(*index),
            Self::Exceptions {
                exception_index_table: indices,
            }
            | Self::ModulePackages {
                package_index: indices,
            }
            | Self::NestMembers { classes: indices }
            | Self::PermittedSubclasses { classes: indices } => {
                writer.write_table(indices, "class indices")
            }
            Self::Code(code) => code.write_to(writer),
            Self::StackMapTable(stack_map_table) => stack_map_table.write_to(writer),
            Self::InnerClasses { classes } => writer.write_table(classes, "inner classes"),
            Self::EnclosingMethod {
                class_index,
                method_index,
            } => {
                writer.write_u16(*class_index)?;
                writer.write_u16(*method_index)
            }
            Self::Synthetic | Self::Deprecated => Ok(()),
            Self::SourceDebugExtension {
                debug_extension: bytes,
            }
            | Self::Unknown(bytes) => writer.write_bytes(bytes),
            Self::LineNumberTable { line_number_table } => {
                writer.write_table(line_number_table, "line numbers")
            }
            Self::LocalVariableTable {
                local_variable_table,
            } => writer.write_table(local_variable_table, "local variables"),
            Self::LocalVariableTypeTable {
                local_variable_type_table,
            } => writer.write_table(local_variable_type_table, "local variable types"),
            Self::RuntimeVisibleAnnotations { annotations }
            | Self::RuntimeInvisibleAnnotations { annotations } => {
                writer.write_table(annotations, "annotations")
            }
            Self::RuntimeVisibleParameterAnnotations {
                parameter_annotations,
            }
            | Self::RuntimeInvisibleParameterAnnotations {
                parameter_annotations,
            } => writer.write_short_table(parameter_annotations, "annotated parameters"),
            Self::RuntimeVisibleTypeAnnotations { annotations }
            | Self::RuntimeInvisibleTypeAnnotations { annotations } => {
                writer.write_table(annotations, "type annotations")
            }
            Self::AnnotationDefault { default_value } => default_value.write_to(writer),
            Self::BootstrapMethods { bootstrap_methods } => {
                writer.write_table(bootstrap_methods, "bootstrap methods")
            }
            Self::MethodParameters { parameters } => {
                writer.write_short_table(parameters, "method parameters")
            }
            Self::Module(module) => module.write_to(writer),
            Self::Record { components } => writer.write_table(components, "record components"),
        }
    }

    /// The payload length written into the attribute header. Fails when raw
    /// bytes or bytecode no longer fit a `u4`.
    pub(crate) fn checked_byte_length(&self) -> Result<u32> {
        match self {
            Self::SourceDebugExtension {
                debug_extension: bytes,
            }
            | Self::Unknown(bytes) => {
                u4_length(bytes.len(), "attribute bytes")?;
            }
            Self::Code(code) => {
                u4_length(code.code.len(), "code bytes")?;
            }
            _ => {}
        }
        Ok(self.byte_length())
    }

    /// Encoded size of the payload, excluding the six-byte attribute header.
    ///
    /// Payloads are assumed to stay below 4 GiB; writing checks the raw
    /// byte payloads against that limit.
    pub fn byte_length(&self) -> u32 {
        match self {
            Self::ConstantValue { .. }
            | Self::Signature { .. }
            | Self::SourceFile { .. }
            | Self::ModuleMainClass { .. }
            | Self::ModuleTarget { .. }
            | Self::NestHost { .. } => 2,
            Self::Exceptions {
                exception_index_table: indices,
            }
            | Self::ModulePackages {
                package_index: indices,
            }
            | Self::NestMembers { classes: indices }
            | Self::PermittedSubclasses { classes: indices } => table_length(indices),
            Self::Code(code) => code.byte_length(),
            Self::StackMapTable(stack_map_table) => stack_map_table.byte_length(),
            Self::InnerClasses { classes } => table_length(classes),
            Self::EnclosingMethod { .. } => 4,
            Self::Synthetic | Self::Deprecated => 0,
            Self::SourceDebugExtension {
                debug_extension: bytes,
            }
            | Self::Unknown(bytes) => bytes.len() as u32,
            Self::LineNumberTable { line_number_table } => table_length(line_number_table),
            Self::LocalVariableTable {
                local_variable_table,
            } => table_length(local_variable_table),
            Self::LocalVariableTypeTable {
                local_variable_type_table,
            } => table_length(local_variable_type_table),
            Self::RuntimeVisibleAnnotations { annotations }
            | Self::RuntimeInvisibleAnnotations { annotations } => table_length(annotations),
            Self::RuntimeVisibleParameterAnnotations {
                parameter_annotations,
            }
            | Self::RuntimeInvisibleParameterAnnotations {
                parameter_annotations,
            } => 1 + items_length(parameter_annotations),
            Self::RuntimeVisibleTypeAnnotations { annotations }
            | Self::RuntimeInvisibleTypeAnnotations { annotations } => table_length(annotations),
            Self::AnnotationDefault { default_value } => default_value.byte_length(),
            Self::BootstrapMethods { bootstrap_methods } => table_length(bootstrap_methods),
            Self::MethodParameters { parameters } => 1 + items_length(parameters),
            Self::Module(module) => module.byte_length(),
            Self::Record { components } => table_length(components),
        }
    }
}
