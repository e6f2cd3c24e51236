// build.rs

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const LOCALES_DIR: &str = "locales";
const BASE_LANG: &str = "en";

fn main() {
    // 1. Pick the message catalogue: a `lang_*` feature wins, then TOFFEE_LANG, then English.
    let mut feature_langs: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_LANG_").map(str::to_lowercase))
        .collect();
    feature_langs.sort();

    let lang = match feature_langs.first() {
        Some(first) => {
            if feature_langs.len() > 1 {
                println!(
                    "cargo:warning=Several language features enabled ({:?}); using '{}'.",
                    feature_langs, first
                );
            }
            first.clone()
        }
        None => env::var("TOFFEE_LANG").unwrap_or_else(|_| BASE_LANG.to_string()),
    };

    println!("cargo:rustc-env=TOFFEE_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=TOFFEE_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}/", LOCALES_DIR);

    // 2. English is always loaded so that every key has a value.
    let mut messages = read_catalogue(&format!("{}/{}.toml", LOCALES_DIR, BASE_LANG))
        .expect("the base catalogue locales/en.toml must exist and parse");

    // 3. Overlay the selected language, if any.
    if lang != BASE_LANG {
        let path = format!("{}/{}.toml", LOCALES_DIR, lang);
        match read_catalogue(&path) {
            Some(overrides) => messages.extend(overrides),
            None => println!(
                "cargo:warning=Catalogue '{}' missing or invalid. Falling back to '{}'.",
                path, BASE_LANG
            ),
        }
    }

    // 4. Emit `t!("key")` arms expanding to string literals; unknown keys fail to compile.
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in &messages {
        let literal = value.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, literal));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing message key: \", $key)) }};\n",
    );
    code.push('}');

    let out_dir = env::var("OUT_DIR").expect("cargo always sets OUT_DIR");
    fs::write(Path::new(&out_dir).join("messages.rs"), code)
        .expect("failed to write the generated message macro");
}

fn read_catalogue(path: &str) -> Option<BTreeMap<String, String>> {
    let content = fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}
