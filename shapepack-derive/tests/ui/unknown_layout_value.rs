use shapepack_derive::MsgShape;

#[derive(Clone, PartialEq, MsgShape)]
#[msgpack(layout = "linked_list")]
struct Point {
    x: f64,
    y: f64,
}

fn main() {}
