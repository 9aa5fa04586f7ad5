use std::io::{Read, Write};

use crate::{
    record::table_length, writer::u4_length, ConstantPool, Parser, Record, Result, Writer,
};

use super::{AttributeInfo, Attributes, StackMapTable};

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    // zero catches everything, as for `finally`
    pub catch_type: u16,
}
impl Record for ExceptionTableEntry {
    fn read_from<R: Read>(parser: &mut Parser<R>, _: &ConstantPool) -> Result<Self> {
        Ok(Self {
            start_pc: parser.read_u16()?,
            end_pc: parser.read_u16()?,
            handler_pc: parser.read_u16()?,
            catch_type: parser.read_u16()?,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.start_pc)?;
        writer.write_u16(self.end_pc)?;
        writer.write_u16(self.handler_pc)?;
        writer.write_u16(self.catch_type)
    }

    fn byte_length(&self) -> u32 {
        8
    }
}

/// A method body. The instructions are kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}
impl CodeAttribute {
    pub fn stack_map_table(&self) -> Option<&StackMapTable> {
        self.attributes.iter().find_map(|a| match &a.info {
            AttributeInfo::StackMapTable(stack_map_table) => Some(stack_map_table),
            _ => None,
        })
    }
}
impl Record for CodeAttribute {
    fn read_from<R: Read>(parser: &mut Parser<R>, constant_pool: &ConstantPool) -> Result<Self> {
        let max_stack = parser.read_u16()?;
        let max_locals = parser.read_u16()?;
        let code_length = parser.read_u32()?;
        let code = parser.read_bytes(code_length as usize)?;
        let exception_table = parser.read_table(constant_pool)?;
        let attributes = parser.parse_attributes(constant_pool)?;

        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn write_to<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_u16(self.max_stack)?;
        writer.write_u16(self.max_locals)?;
        writer.write_u32(u4_length(self.code.len(), "code bytes")?)?;
        writer.write_bytes(&self.code)?;
        writer.write_table(&self.exception_table, "exception table entries")?;
        self.attributes.write_to(writer)
    }

    fn byte_length(&self) -> u32 {
        2 + 2
            + 4
            + self.code.len() as u32
            + table_length(&self.exception_table)
            + self.attributes.byte_length()
    }
}

#[cfg(test)]
mod code_attribute_tests {
    use super::*;
    use crate::{attributes::Attribute, CpInfo};

    #[test]
    fn it_should_decode_nested_attributes() {
        let cp = ConstantPool::new(vec![CpInfo::Utf8("LineNumberTable".into())]);
        let bytes = [
            0x00, 0x02, // max_stack
            0x00, 0x01, // max_locals
            0x00, 0x00, 0x00, 0x02, 0x2a, 0xb1, // code
            0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02, 0x00, 0x00, // exception table
            0x00, 0x01, // attributes_count
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x07,
        ];
        let code = CodeAttribute::read_from(&mut Parser::new(&bytes[..]), &cp).unwrap();

        assert_eq!(vec![0x2a, 0xb1], code.code);
        assert_eq!(0, code.exception_table[0].catch_type);
        assert_eq!(1, code.attributes.len());
        assert_eq!(bytes.len() as u32, code.byte_length());
        assert_eq!(None, code.stack_map_table());

        let mut writer = Writer::new(Vec::new());
        code.write_to(&mut writer).unwrap();
        assert_eq!(&bytes[..], &writer.into_inner()[..]);
    }

    #[test]
    fn it_should_track_edits_in_its_length() {
        let mut code = CodeAttribute {
            max_stack: 0,
            max_locals: 0,
            code: vec![0xb1],
            exception_table: vec![],
            attributes: Attributes::default(),
        };
        assert_eq!(13, code.byte_length());

        code.code.extend_from_slice(&[0x00, 0x00]);
        code.attributes.push(Attribute {
            attribute_name_index: 1,
            info: AttributeInfo::Unknown(vec![1, 2, 3]),
        });
        assert_eq!(13 + 2 + 9, code.byte_length());
    }
}
