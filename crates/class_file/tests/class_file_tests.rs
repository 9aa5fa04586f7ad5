use clasp_class_file::{
    attributes::{Attribute, BootstrapMethod, CodeAttribute},
    constant_pool::ClassInfo,
    AccessFlags, AttributeInfo, Attributes, ClassFile, ClassFileError, ConstantPool, CpInfo,
    CpTag, ErrorKind, MemberInfo, ReadOptions, Record, Writer, MAX_NESTING,
};

fn u2(v: u16) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

fn u4(v: u32) -> Vec<u8> {
    v.to_be_bytes().to_vec()
}

fn table(items: &[Vec<u8>]) -> Vec<u8> {
    [u2(items.len() as u16), items.concat()].concat()
}

fn attribute(name_index: u16, payload: &[u8]) -> Vec<u8> {
    [u2(name_index), u4(payload.len() as u32), payload.to_vec()].concat()
}

fn member(access_flags: u16, name_index: u16, descriptor_index: u16, attributes: &[Vec<u8>]) -> Vec<u8> {
    [
        u2(access_flags),
        u2(name_index),
        u2(descriptor_index),
        table(attributes),
    ]
    .concat()
}

#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    slots: u16,
}
impl Pool {
    fn entry(&mut self, tag: u8, payload: &[u8], slots: u16) -> u16 {
        self.bytes.push(tag);
        self.bytes.extend_from_slice(payload);
        let index = self.slots + 1;
        self.slots += slots;
        index
    }

    fn utf8(&mut self, s: &str) -> u16 {
        self.entry(1, &[u2(s.len() as u16), s.as_bytes().to_vec()].concat(), 1)
    }

    fn integer(&mut self, v: i32) -> u16 {
        self.entry(3, &v.to_be_bytes(), 1)
    }

    fn long(&mut self, v: i64) -> u16 {
        self.entry(5, &v.to_be_bytes(), 2)
    }

    fn double(&mut self, v: f64) -> u16 {
        self.entry(6, &v.to_bits().to_be_bytes(), 2)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.entry(7, &u2(name_index), 1)
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        self.entry(12, &[u2(name_index), u2(descriptor_index)].concat(), 1)
    }

    fn method_ref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        self.entry(10, &[u2(class_index), u2(name_and_type_index)].concat(), 1)
    }
}

const CUSTOM_PAYLOAD: [u8; 7] = [0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02];
const FIRST_TAG: usize = 10;

struct Sample {
    bytes: Vec<u8>,
    pool_end: usize,
    class_attributes: usize,
}

/// A class with a field, a constructor, an abstract method and a few class
/// attributes, laid out the way javac would.
fn sample(source_file: &str) -> Sample {
    let mut cp = Pool::default();
    cp.long(0x0102_0304_0506_0708);
    let this_class = cp.class("demo/Sample");
    let super_class = cp.class("java/lang/Object");
    let count = cp.utf8("count");
    let int = cp.utf8("I");
    let constant_value = cp.utf8("ConstantValue");
    let forty_two = cp.integer(42);
    let init = cp.utf8("<init>");
    let void_descriptor = cp.utf8("()V");
    let code = cp.utf8("Code");
    let line_number_table = cp.utf8("LineNumberTable");
    let stack_map_table = cp.utf8("StackMapTable");
    let source_file_attribute = cp.utf8("SourceFile");
    let source_file = cp.utf8(source_file);
    let custom = cp.utf8("XyzCustom");
    let deprecated = cp.utf8("Deprecated");
    let init_name_and_type = cp.name_and_type(init, void_descriptor);
    let object_init = cp.method_ref(super_class, init_name_and_type);
    cp.double(1.5);
    let exceptions = cp.utf8("Exceptions");
    let io_exception = cp.class("java/io/IOException");
    let run = cp.utf8("run");
    let annotations = cp.utf8("RuntimeVisibleAnnotations");
    let deprecated_type = cp.utf8("Ljava/lang/Deprecated;");

    let field = member(
        0x0012,
        count,
        int,
        &[attribute(constant_value, &u2(forty_two))],
    );

    let mut instructions = vec![0x2a, 0xb7];
    instructions.extend(u2(object_init));
    instructions.resize(19, 0x00);
    instructions.push(0xb1);
    let code_payload = [
        u2(1),
        u2(1),
        u4(instructions.len() as u32),
        instructions,
        table(&[]),
        table(&[
            attribute(line_number_table, &[u2(1), u2(0), u2(3)].concat()),
            attribute(stack_map_table, &[u2(3), vec![5, 0, 10]].concat()),
        ]),
    ]
    .concat();
    let constructor = member(0x0001, init, void_descriptor, &[attribute(code, &code_payload)]);

    let abstract_method = member(
        0x0401,
        run,
        void_descriptor,
        &[
            attribute(exceptions, &table(&[u2(io_exception)])),
            attribute(
                annotations,
                &table(&[[u2(deprecated_type), u2(0)].concat()]),
            ),
        ],
    );

    let header = [u4(0xCAFEBABE), u2(0), u2(61), u2(cp.slots + 1), cp.bytes].concat();
    let pool_end = header.len();
    let body = [
        u2(0x0021),
        u2(this_class),
        u2(super_class),
        table(&[]),
        table(&[field]),
        table(&[constructor, abstract_method]),
    ]
    .concat();
    let class_attributes = pool_end + body.len();
    let attributes = table(&[
        attribute(source_file_attribute, &u2(source_file)),
        attribute(custom, &CUSTOM_PAYLOAD),
        attribute(deprecated, &[]),
    ]);

    Sample {
        bytes: [header, body, attributes].concat(),
        pool_end,
        class_attributes,
    }
}

fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

fn decode(bytes: &[u8]) -> ClassFile {
    init_logging();
    ClassFile::read_from_bytes(bytes).unwrap()
}

fn assert_lengths(attributes: &Attributes) {
    for attribute in attributes {
        let mut writer = Writer::new(Vec::new());
        attribute.write_to(&mut writer).unwrap();
        assert_eq!(writer.into_inner().len() as u32, attribute.byte_length());

        if let AttributeInfo::Code(CodeAttribute { attributes, .. }) = &attribute.info {
            assert_lengths(attributes);
        }
    }
}

#[test]
fn test_round_trip_identity() {
    let sample = sample("Sample.java");
    let class_file = decode(&sample.bytes);

    assert_eq!(sample.bytes, class_file.write_to_bytes().unwrap());
    assert_eq!(sample.bytes.len() as u32, class_file.byte_length());
}

#[test]
fn test_length_accuracy() {
    let class_file = decode(&sample("Sample.java").bytes);

    assert_lengths(&class_file.attributes);
    for member in class_file.fields.iter().chain(&class_file.methods) {
        assert_lengths(&member.attributes);
        let mut writer = Writer::new(Vec::new());
        member.write_to(&mut writer).unwrap();
        assert_eq!(writer.into_inner().len() as u32, member.byte_length());
    }
}

#[test]
fn test_constant_pool_indexing() {
    let class_file = decode(&sample("Sample.java").bytes);
    let cp = &class_file.constant_pool;

    assert!(matches!(
        cp.resolve(1, CpTag::Long),
        Ok(CpInfo::Long(0x0102_0304_0506_0708))
    ));
    assert!(matches!(
        cp.resolve(2, CpTag::Long),
        Err(ClassFileError::UnusableConstantPoolSlot(2))
    ));
    assert!(cp.resolve(2, CpTag::Utf8).is_err());
    assert!(matches!(cp.resolve(3, CpTag::Utf8), Ok(CpInfo::Utf8(s)) if s == "demo/Sample"));
    assert!(cp.resolve(3, CpTag::Class).is_err());
    assert!(cp.resolve(0, CpTag::Utf8).is_err());
    assert!(cp.resolve(cp.len() as u16 + 1, CpTag::Utf8).is_err());
}

#[test]
fn test_lookups() {
    let class_file = decode(&sample("Sample.java").bytes);

    assert_eq!("demo/Sample", class_file.class_name().unwrap());
    assert_eq!(
        Some("java/lang/Object"),
        class_file.super_class().unwrap().as_deref()
    );
    assert!(class_file.interface_names().unwrap().is_empty());
    assert_eq!(
        AccessFlags::PUBLIC | AccessFlags::SUPER,
        class_file.access_flags
    );

    let field = class_file.find_field("count", "I").unwrap();
    assert_eq!(AccessFlags::PRIVATE | AccessFlags::FINAL, field.access_flags);
    assert_eq!("count", class_file.field_name(field).unwrap());
    assert_eq!("I", class_file.field_descriptor(field).unwrap());

    let run = class_file.find_method("run", "()V").unwrap();
    assert!(run.access_flags.contains(AccessFlags::ABSTRACT));
    assert!(run.attributes.code_attribute().is_none());
    assert!(matches!(
        &run.attributes.find_by_name("Exceptions", &class_file.constant_pool).unwrap().info,
        AttributeInfo::Exceptions { exception_index_table } if exception_index_table.len() == 1
    ));
    assert_eq!(
        "<init>",
        class_file.method_name(&class_file.methods[0]).unwrap()
    );
}

#[test]
fn test_stack_map_offsets() {
    let class_file = decode(&sample("Sample.java").bytes);
    let code = class_file
        .find_method("<init>", "()V")
        .and_then(|m| m.attributes.code_attribute())
        .unwrap();

    assert_eq!(20, code.code.len());
    assert_eq!(
        vec![5, 6, 17],
        code.stack_map_table().unwrap().bytecode_offsets()
    );
}

#[test]
fn test_unknown_attribute_preservation() {
    let class_file = decode(&sample("Sample.java").bytes);
    let custom = class_file
        .attributes
        .find_by_name("XyzCustom", &class_file.constant_pool)
        .unwrap();

    assert_eq!(AttributeInfo::Unknown(CUSTOM_PAYLOAD.to_vec()), custom.info);
    assert_eq!(None, custom.info.name());

    let mut writer = Writer::new(Vec::new());
    custom.write_to(&mut writer).unwrap();
    let bytes = writer.into_inner();
    assert_eq!(u2(custom.attribute_name_index), bytes[..2]);
    assert_eq!(u4(7), bytes[2..6]);
    assert_eq!(CUSTOM_PAYLOAD, bytes[6..]);
}

#[test]
fn test_truncation_is_distinct_from_a_bad_tag() {
    let sample = sample("Sample.java");

    let truncated = ClassFile::read_from_bytes(&sample.bytes[..sample.pool_end]).unwrap_err();
    assert_eq!(ErrorKind::Truncated, truncated.kind());

    let mut corrupted = sample.bytes.clone();
    corrupted[FIRST_TAG] = 0xee;
    let malformed = ClassFile::read_from_bytes(&corrupted).unwrap_err();
    assert_eq!(ErrorKind::Malformed, malformed.kind());
    assert!(matches!(malformed, ClassFileError::InvalidCpInfoTag(0xee)));
}

#[test]
fn test_tolerated_truncation() {
    init_logging();
    let sample = sample("Sample.java");
    let options = ReadOptions::new().tolerate_truncation(true);

    // ends inside the SourceFile attribute
    let cut = &sample.bytes[..sample.class_attributes + 2 + 7];
    assert!(ClassFile::read_from_bytes(cut).unwrap_err().is_truncated());
    let class_file = ClassFile::read_with_options(cut, options).unwrap();
    assert!(class_file.attributes.is_empty());

    // ends inside the custom attribute
    let cut = &sample.bytes[..sample.class_attributes + 2 + 8 + 9];
    let class_file = ClassFile::read_with_options(cut, options).unwrap();
    assert_eq!(1, class_file.attributes.len());
    assert_eq!(Some("SourceFile"), class_file.attributes.0[0].info.name());

    // anything earlier is still an error
    let cut = &sample.bytes[..sample.class_attributes - 1];
    assert!(ClassFile::read_with_options(cut, options)
        .unwrap_err()
        .is_truncated());
}

/// A class whose single abstract method carries `method_attribute`.
fn class_with_method_attribute(build: impl FnOnce(&mut Pool) -> Vec<u8>) -> Vec<u8> {
    let mut cp = Pool::default();
    let this_class = cp.class("demo/Deep");
    let run = cp.utf8("run");
    let void_descriptor = cp.utf8("()V");
    let method_attribute = build(&mut cp);

    [
        u4(0xCAFEBABE),
        u2(0),
        u2(61),
        u2(cp.slots + 1),
        cp.bytes,
        u2(0x0021),
        u2(this_class),
        u2(0),
        table(&[]),
        table(&[]),
        table(&[member(0x0401, run, void_descriptor, &[method_attribute])]),
        table(&[]),
    ]
    .concat()
}

#[test]
fn test_deeply_nested_element_values_are_malformed() {
    init_logging();
    let bytes = class_with_method_attribute(|cp| {
        let annotations = cp.utf8("RuntimeVisibleAnnotations");
        let marker = cp.utf8("Ldemo/Marker;");
        let value = cp.utf8("value");
        // @Marker(value = [[[ ... 1 ... ]]])
        let element_value = [[b'[', 0x00, 0x01].repeat(10_000), vec![b'I'], u2(value)].concat();
        let annotation = [u2(marker), u2(1), u2(value), element_value].concat();
        attribute(annotations, &table(&[annotation]))
    });

    let e = ClassFile::read_from_bytes(&bytes).unwrap_err();
    assert_eq!(ErrorKind::Malformed, e.kind());
    assert!(matches!(e, ClassFileError::NestingTooDeep { .. }));

    let lenient = ReadOptions::new().strict_attributes(false);
    let class_file = ClassFile::read_with_options(&bytes[..], lenient).unwrap();
    assert!(matches!(
        class_file.methods[0].attributes.0[0].info,
        AttributeInfo::Unknown(_)
    ));
    assert_eq!(bytes, class_file.write_to_bytes().unwrap());
}

#[test]
fn test_deeply_nested_code_attributes_are_malformed() {
    init_logging();
    let nested_code = |levels: usize| {
        class_with_method_attribute(|cp| {
            let code = cp.utf8("Code");
            let body = |attributes: Vec<Vec<u8>>| {
                [u2(0), u2(0), u4(1), vec![0xb1], table(&[]), table(&attributes)].concat()
            };
            let mut payload = body(vec![]);
            for _ in 1..levels {
                payload = body(vec![attribute(code, &payload)]);
            }
            attribute(code, &payload)
        })
    };

    let bytes = nested_code(MAX_NESTING as usize);
    let class_file = decode(&bytes);
    assert_eq!(bytes, class_file.write_to_bytes().unwrap());

    let e = ClassFile::read_from_bytes(&nested_code(MAX_NESTING as usize + 1)).unwrap_err();
    assert!(matches!(
        e,
        ClassFileError::NestingTooDeep {
            what: "attributes",
            ..
        }
    ));
    assert!(ClassFile::read_from_bytes(&nested_code(1_000)).is_err());
}

#[test]
fn test_edit_then_resize() {
    let original = sample("Sample.java");
    let expected = sample("SampleWithAMuchLongerName.java");

    let mut class_file = decode(&original.bytes);
    let index = class_file.constant_pool.find_utf8("Sample.java").unwrap();
    class_file
        .constant_pool
        .utf8_mut(index)
        .unwrap()
        .set("SampleWithAMuchLongerName.java");

    let bytes = class_file.write_to_bytes().unwrap();
    assert_eq!(expected.bytes, bytes);
    assert_eq!(bytes.len() as u32, class_file.byte_length());
    assert_eq!(original.bytes.len() + 19, bytes.len());
}

#[test]
fn test_code_edits_resize_the_enclosing_attribute() {
    let mut class_file = decode(&sample("Sample.java").bytes);
    let before = class_file.byte_length();

    let code = class_file
        .find_method_mut("<init>", "()V")
        .and_then(|m| m.attributes.code_attribute_mut())
        .unwrap();
    code.code.insert(0, 0x00);

    let bytes = class_file.write_to_bytes().unwrap();
    assert_eq!(before + 1, bytes.len() as u32);

    let reread = decode(&bytes);
    assert_eq!(class_file, reread);
}

#[test]
fn test_build_from_scratch() {
    let mut constant_pool = ConstantPool::default();
    let name = constant_pool.push(CpInfo::Utf8("Built".into())).unwrap();
    let this_class = constant_pool
        .push(CpInfo::Class(ClassInfo { name_index: name }))
        .unwrap();
    let wide = constant_pool.push(CpInfo::Double(2.0)).unwrap();
    let bootstrap = constant_pool
        .push(CpInfo::Utf8("BootstrapMethods".into()))
        .unwrap();
    assert_eq!((1, 2, 3, 5), (name, this_class, wide, bootstrap));

    let class_file = ClassFile {
        minor_version: 0,
        major_version: 52,
        constant_pool,
        access_flags: AccessFlags::PUBLIC | AccessFlags::FINAL,
        this_class,
        super_class: 0,
        interfaces: vec![],
        fields: vec![],
        methods: vec![MemberInfo {
            access_flags: AccessFlags::STATIC,
            name_index: name,
            descriptor_index: name,
            attributes: Attributes::default(),
        }],
        attributes: Attributes(vec![Attribute {
            attribute_name_index: bootstrap,
            info: AttributeInfo::BootstrapMethods {
                bootstrap_methods: vec![BootstrapMethod {
                    bootstrap_method_ref: 3,
                    bootstrap_arguments: vec![1, 2],
                }],
            },
        }]),
    };

    let bytes = class_file.write_to_bytes().unwrap();
    assert_eq!(class_file.byte_length() as usize, bytes.len());
    assert_eq!(&[0xca, 0xfe, 0xba, 0xbe, 0x00, 0x00, 0x00, 0x34, 0x00, 0x06], &bytes[..10]);

    let reread = decode(&bytes);
    assert_eq!(class_file, reread);
    assert_eq!(None, reread.super_class().unwrap());
    assert_eq!(
        vec![1, 2],
        reread.bootstrap_methods().unwrap()[0].bootstrap_arguments
    );
}

#[test]
fn test_files_on_disk() {
    let sample = sample("Sample.java");
    let path = std::env::temp_dir().join(format!("clasp-{}.class", std::process::id()));

    decode(&sample.bytes).write_to_path(&path).unwrap();
    let class_file = ClassFile::read_from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(sample.bytes, class_file.write_to_bytes().unwrap());
    assert!(matches!(
        ClassFile::read_from_path(&path),
        Err(ClassFileError::IOError(_))
    ));
}
