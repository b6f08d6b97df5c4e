use marbatch::components::Renderable;
use marbatch::geometry::*;

#[test]
fn primitive_sizes() {
    let sizes: Vec<(usize, usize)> = Shape::ALL
        .iter()
        .map(|s| (s.vertices().len(), s.indices().len()))
        .collect();
    assert_eq!(sizes, vec![(8, 36), (5, 18), (8, 36), (4, 6)]);
}

#[test]
fn names_round_trip() {
    for shape in Shape::ALL {
        assert_eq!(Shape::from_name(shape.name()), Some(shape));
    }
    assert_eq!(Shape::from_name("Teapot"), None);
}

#[test]
fn surface_is_flat_at_floor_height() {
    assert!(Shape::Surface.vertices().iter().all(|v| v.position[1] == -1.0));
}

#[test]
fn renderable_from_shape_is_named_after_it() {
    let r = Renderable::from_shape(Shape::Pyramid);
    assert_eq!(r.name, "Pyramid");
    assert_eq!(r.vertex_count(), 5);
    assert_eq!(r.index_count(), 18);
}

#[test]
fn vertex_layout_stride_matches_struct() {
    assert_eq!(Vertex::layout().array_stride, 36);
}
