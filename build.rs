use std::fs;

const CONFIG_PATH: &str = "src/default_config.toml";

fn main() {
    println!("cargo:rerun-if-changed={CONFIG_PATH}");

    let content = fs::read_to_string(CONFIG_PATH)
        .unwrap_or_else(|e| panic!("cannot read {CONFIG_PATH}: {e}"));
    let table = content
        .parse::<toml::Table>()
        .unwrap_or_else(|e| panic!("invalid {CONFIG_PATH}: {e}"));

    // [tables] keep_unexpanded_row must be explicit
    let keep_row = table
        .get("tables")
        .and_then(|tables| tables.get("keep_unexpanded_row"));
    if !matches!(keep_row, Some(toml::Value::Boolean(_))) {
        panic!("{CONFIG_PATH} must set [tables] keep_unexpanded_row to a boolean");
    }
}
