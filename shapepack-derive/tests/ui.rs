#[test]
fn ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/valid_map_layout.rs");
    t.compile_fail("tests/ui/unknown_layout_value.rs");
    t.compile_fail("tests/ui/tuple_struct_rejected.rs");
}
