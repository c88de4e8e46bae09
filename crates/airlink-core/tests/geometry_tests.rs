//! Coordinate transform tests

use airlink_core::{to_local, Error, Point2D, ScreenTransform, TransformTarget};

/// Test element whose transform can be swapped between reads
struct FakeElement {
    transform: Option<ScreenTransform>,
}

impl TransformTarget for FakeElement {
    fn screen_transform(&self) -> Option<ScreenTransform> {
        self.transform
    }
}

#[test]
fn test_identity_roundtrip() {
    let element = FakeElement {
        transform: Some(ScreenTransform::IDENTITY),
    };

    let local = to_local(Point2D::new(100.0, 50.0), &element).unwrap();
    assert_eq!(local, Point2D::new(100.0, 50.0));
}

#[test]
fn test_translated_element() {
    // Element rendered at (30, 20): screen (130, 70) is local (100, 50)
    let element = FakeElement {
        transform: Some(ScreenTransform::translate(30.0, 20.0)),
    };

    let local = to_local(Point2D::new(130.0, 70.0), &element).unwrap();
    assert!((local.x - 100.0).abs() < 1e-9);
    assert!((local.y - 50.0).abs() < 1e-9);
}

#[test]
fn test_scaled_element() {
    // Element zoomed 2x: screen distance is twice local distance
    let element = FakeElement {
        transform: Some(ScreenTransform::scale(2.0, 2.0)),
    };

    let local = to_local(Point2D::new(100.0, 50.0), &element).unwrap();
    assert!((local.x - 50.0).abs() < 1e-9);
    assert!((local.y - 25.0).abs() < 1e-9);
}

#[test]
fn test_scale_then_translate() {
    let ctm = ScreenTransform::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0);
    let element = FakeElement {
        transform: Some(ctm),
    };

    let local = Point2D::new(45.0, 20.0);
    let screen = ctm.apply(local);
    let roundtrip = to_local(screen, &element).unwrap();
    assert!((roundtrip.x - local.x).abs() < 1e-9);
    assert!((roundtrip.y - local.y).abs() < 1e-9);
}

#[test]
fn test_missing_target() {
    let element = FakeElement { transform: None };
    let result = to_local(Point2D::new(1.0, 1.0), &element);
    assert!(matches!(result, Err(Error::MissingTarget)));
}

#[test]
fn test_singular_transform() {
    let element = FakeElement {
        transform: Some(ScreenTransform::scale(0.0, 0.0)),
    };
    let result = to_local(Point2D::new(1.0, 1.0), &element);
    assert!(matches!(result, Err(Error::SingularTransform)));
}

#[test]
fn test_live_transform_is_read_per_call() {
    // Simulates pan/zoom between events
    let mut element = FakeElement {
        transform: Some(ScreenTransform::IDENTITY),
    };

    let before = to_local(Point2D::new(10.0, 10.0), &element).unwrap();
    assert_eq!(before, Point2D::new(10.0, 10.0));

    element.transform = Some(ScreenTransform::translate(5.0, 0.0));
    let after = to_local(Point2D::new(10.0, 10.0), &element).unwrap();
    assert_eq!(after, Point2D::new(5.0, 10.0));
}
