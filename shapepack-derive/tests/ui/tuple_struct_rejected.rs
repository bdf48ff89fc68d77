use shapepack_derive::MsgShape;

#[derive(Clone, PartialEq, MsgShape)]
struct Point(f64, f64);

fn main() {}
