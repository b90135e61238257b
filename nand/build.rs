// build.rs
//
// Generates the Denali platform catalog from configs/nand/denali.toml.
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use toml::Value;

/// Constants of `CapabilityFlags` in src/drivers/nand/catalog.rs
const KNOWN_CAPS: &[&str] = &["HW_ECC_FIXUP", "DMA_64BIT"];

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let config_path = manifest_dir.join("../configs/nand/denali.toml");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", config_path.display());

    let cfg_str = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("nand: cannot read {}: {}", config_path.display(), e));
    let cfg: Value = toml::from_str(&cfg_str)
        .unwrap_or_else(|e| panic!("nand: {} is not valid TOML: {}", config_path.display(), e));

    let catalog = generate_catalog(&cfg);

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("denali_catalog.rs"), catalog.to_string()).unwrap();
}

fn generate_catalog(cfg: &Value) -> TokenStream {
    let platforms = cfg
        .get("platform")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut seen = HashSet::new();
    let mut profiles = Vec::new();
    let mut entries = Vec::new();

    for (i, platform) in platforms.iter().enumerate() {
        let compatible = platform
            .get("compatible")
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("nand: platform #{} has no compatible string", i));
        if !seen.insert(compatible.to_owned()) {
            panic!("nand: compatible \"{}\" listed twice", compatible);
        }

        let revision = match platform.get("revision") {
            None => 0u32,
            Some(Value::Integer(n)) => u32::try_from(*n)
                .unwrap_or_else(|_| panic!("nand: {}: revision {} out of range", compatible, n)),
            Some(Value::String(s)) => parse_hex(s)
                .unwrap_or_else(|| panic!("nand: {}: bad revision \"{}\"", compatible, s)),
            Some(other) => {
                panic!("nand: {}: revision must be an integer, got {}", compatible, other)
            }
        };

        let caps: Vec<_> = platform
            .get("caps")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|c| {
                let name = c
                    .as_str()
                    .unwrap_or_else(|| panic!("nand: {}: caps must be strings", compatible));
                if !KNOWN_CAPS.contains(&name) {
                    panic!(
                        "nand: {}: unknown cap \"{}\" (known: {:?})",
                        compatible, name, KNOWN_CAPS
                    );
                }
                format_ident!("{}", name)
            })
            .collect();

        let ident = format_ident!("{}", static_name(compatible));
        profiles.push(quote! {
            static #ident: PlatformProfile = PlatformProfile {
                revision: #revision,
                caps: CapabilityFlags::empty()#(.union(CapabilityFlags::#caps))*,
            };
        });
        entries.push(quote! {
            OfMatch { compatible: #compatible, data: Some(&#ident) }
        });
    }

    let count = entries.len();
    quote! {
        #(#profiles)*

        /// Supported Denali integrations, in match priority order.
        pub static DENALI_OF_MATCH: [OfMatch; #count] = [#(#entries),*];
    }
}

fn static_name(compatible: &str) -> String {
    let mut name: String = compatible
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    name.push_str("_PROFILE");
    name
}

fn parse_hex(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}
