use std::{env, fs};

use clasp_class_file::{AttributeInfo, ClassFile, ReadOptions};

fn main() {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: classdump <file.class> [rewritten.class]");
        return;
    };
    let bytes = fs::read(&path).unwrap();

    let class_file = match ClassFile::read_from_bytes(&bytes) {
        Ok(class_file) => class_file,
        Err(e) if e.is_truncated() => {
            log::warn!("{}: {}, retrying with truncation tolerated", path, e);
            ClassFile::read_with_options(&bytes[..], ReadOptions::new().tolerate_truncation(true))
                .unwrap()
        }
        Err(e) => panic!("{}: {}", path, e),
    };

    println!(
        "{} (version {}.{})",
        class_file.class_name().unwrap(),
        class_file.major_version,
        class_file.minor_version
    );
    if let Some(super_class) = class_file.super_class().unwrap() {
        println!("  extends {}", super_class);
    }
    for interface in class_file.interface_names().unwrap() {
        println!("  implements {}", interface);
    }
    println!("  access flags: {:?}", class_file.access_flags);
    println!("  constant pool: {} slots", class_file.constant_pool.len());

    println!();
    for field in &class_file.fields {
        println!(
            "  field {} {}",
            class_file.field_name(field).unwrap(),
            class_file.field_descriptor(field).unwrap()
        );
    }
    for method in &class_file.methods {
        print!(
            "  method {}{}",
            class_file.method_name(method).unwrap(),
            class_file.method_descriptor(method).unwrap()
        );
        match method.attributes.code_attribute() {
            Some(code) => println!(" ({} bytes of code)", code.code.len()),
            None => println!(),
        }
    }

    println!();
    for attribute in &class_file.attributes {
        let name = class_file
            .constant_pool
            .utf8(attribute.attribute_name_index)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let kind = match &attribute.info {
            AttributeInfo::Unknown(_) => " (unknown)",
            _ => "",
        };
        println!("  attribute {}{}: {} bytes", name, kind, attribute.info.byte_length());
    }

    if let Some(out) = args.next() {
        let rewritten = class_file.write_to_bytes().unwrap();
        if rewritten == bytes {
            println!();
            println!("Rewritten byte for byte to {}", out);
        } else {
            log::warn!("{} re-encodes to {} bytes instead of {}", path, rewritten.len(), bytes.len());
        }
        fs::write(out, rewritten).unwrap();
    }
}
