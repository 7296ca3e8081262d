use crudforge_codegen::projection::Target;

fn main() {
    // Generate Rust DTOs for integration tests
    // The generated code is only used by tests (via include!), so it won't
    // affect normal library compilation
    let out_dir = std::env::var("OUT_DIR").unwrap();
    crudforge_codegen::CodegenBuilder::new("fixtures/catalog.rs")
        .dto_target(Target::Rust)
        .dto_dir("models")
        .output_dir(&out_dir)
        .force()
        .generate()
        .expect("codegen failed");

    println!("cargo:rerun-if-changed=fixtures/catalog.rs");
}
