use std::fs;

const SECTIONS: [&str; 6] = ["headings", "lists", "rules", "links", "tables", "convert"];

fn main() {
    // The bundled config is include_str!'d into the library; reject a broken one at build time
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={config_path}");

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");
    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {e}"),
    };

    for section in SECTIONS {
        if !table.get(section).is_some_and(toml::Value::is_table) {
            panic!("default_config.toml is missing the [{section}] table");
        }
    }
}
