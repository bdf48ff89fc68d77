use shapepack_derive::MsgShape;

#[derive(Clone, PartialEq, MsgShape)]
#[msgpack(layout = "map")]
struct Point {
    #[msgpack(name = "x")]
    x: f64,
    #[msgpack(name = "y")]
    y: f64,
}

impl Default for Point {
    fn default() -> Self {
        Point { x: 0.0, y: 0.0 }
    }
}

fn main() {}
