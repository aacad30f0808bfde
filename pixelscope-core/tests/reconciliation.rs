#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
//! Invariants that must hold across image switches, zoom and drags.

use pixelscope_core::{
    BrightnessProfile, ChannelVisibilityStore, CoordinateMapper, DisplayStateStore, DtypeClass,
    Image, ImageRect, ImageShape, NudgeStep, PixelBuffer, SelectionModel, ViewerSession,
    WidgetPoint, ZoomState,
};

/// Small deterministic generator so sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn step(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> usize {
        (self.step() % n) as usize
    }

    fn unit(&mut self) -> f64 {
        self.step() as f64 / f64::from(1u32 << 31)
    }
}

fn image(height: usize, width: usize, channels: usize) -> Image {
    Image::new(
        PixelBuffer::filled(ImageShape::new(height, width, channels), 0.0, DtypeClass::Uint8)
            .unwrap(),
    )
}

#[test]
fn channel_store_length_tracks_maximum() {
    let mut rng = Lcg(7);
    let mut store = ChannelVisibilityStore::new();
    let mut max_seen = 0;
    for _ in 0..500 {
        let count = rng.below(9);
        let before = store.len();
        store.on_image_switch(count);
        max_seen = max_seen.max(count);
        assert!(store.len() >= before);
        assert_eq!(store.len(), max_seen);
    }
}

#[test]
fn hidden_channel_survives_wider_image() {
    let mut session = ViewerSession::new();
    session.switch_image(&image(8, 8, 3));
    session.channels_mut().set_visible(1, false).unwrap();

    session.switch_image(&image(8, 8, 4));
    assert_eq!(session.channels().flags(), &[true, false, true, true]);

    session.switch_image(&image(8, 8, 3));
    assert_eq!(&session.channels().flags()[..3], &[true, false, true]);
    assert_eq!(session.channels().visible_channels(3), vec![0, 2]);
}

#[test]
fn selection_stays_in_bounds_under_random_edits() {
    let mut rng = Lcg(42);
    let (width, height) = (37, 23);
    let mut model = SelectionModel::new(width, height);

    for _ in 0..2000 {
        let action = rng.below(4);
        let scale = [0.25, 0.5, 1.0, 3.0, 8.0][rng.below(5)];
        let mapper = CoordinateMapper::new(
            ZoomState::new(scale, rng.unit() * 10.0 - 5.0, rng.unit() * 10.0 - 5.0),
            width,
            height,
        );
        let span_x = width as f64 * scale * 1.5;
        let span_y = height as f64 * scale * 1.5;
        let mut point = || WidgetPoint::new(rng.unit() * span_x - 20.0, rng.unit() * span_y - 20.0);

        match action {
            0 | 1 => {
                let start = point();
                let end = point();
                let via = point();
                model.begin_drag(start, &mapper);
                model.update_drag(via, &mapper);
                model.update_drag(end, &mapper);
                model.end_drag();
            }
            2 => {
                let dx = rng.below(5) as i32 - 2;
                let dy = rng.below(5) as i32 - 2;
                let step = if rng.below(2) == 0 {
                    NudgeStep::Fine
                } else {
                    NudgeStep::Coarse
                };
                model.nudge(dx, dy, step);
            }
            _ => {
                model.select_all();
            }
        }

        if let Some(rect) = model.rect() {
            assert!(rect.x0() < rect.x1() && rect.x1() <= width, "{rect}");
            assert!(rect.y0() < rect.y1() && rect.y1() <= height, "{rect}");
        }
    }
}

#[test]
fn widget_round_trip_within_one_pixel() {
    let mut rng = Lcg(3);
    for _ in 0..1000 {
        let scale = 1.0 / 32.0 + rng.unit() * 64.0;
        let zoom = ZoomState::new(scale, rng.unit() * 50.0, rng.unit() * 50.0);
        let mapper = CoordinateMapper::new(zoom, 100_000, 100_000);
        let point = WidgetPoint::new(rng.unit() * 2000.0, rng.unit() * 2000.0);

        let back = mapper.to_widget_space(mapper.to_image_space(point));
        // The pixel's top-left corner is at most one image pixel away.
        assert!(point.x - back.x >= -1e-9 && point.x - back.x < scale + 1e-9);
        assert!(point.y - back.y >= -1e-9 && point.y - back.y < scale + 1e-9);
    }
}

#[test]
fn resize_past_opposite_edge_keeps_one_pixel() {
    let mapper = CoordinateMapper::new(ZoomState::new(2.0, 0.0, 0.0), 100, 100);
    for (grab, target) in [
        (WidgetPoint::new(20.0, 50.0), WidgetPoint::new(190.0, 50.0)),
        (WidgetPoint::new(120.0, 50.0), WidgetPoint::new(0.0, 50.0)),
        (WidgetPoint::new(60.0, 20.0), WidgetPoint::new(60.0, 199.0)),
        (WidgetPoint::new(60.0, 120.0), WidgetPoint::new(60.0, 0.0)),
        (WidgetPoint::new(20.0, 20.0), WidgetPoint::new(199.0, 199.0)),
    ] {
        let mut model = SelectionModel::new(100, 100);
        model.set_rect(ImageRect::new(10, 10, 60, 60).unwrap());
        model.begin_drag(grab, &mapper);
        model.update_drag(target, &mapper);
        let rect = model.end_drag().unwrap();
        assert!(rect.x1() > rect.x0() && rect.y1() > rect.y0());
        assert!(rect.width() == 1 || rect.height() == 1, "{rect}");
    }
}

#[test]
fn unseen_class_gets_defaults_without_touching_others() {
    let mut store = DisplayStateStore::new();
    let custom = BrightnessProfile::new(12.0, 2.0, 2000.0);
    store
        .set_brightness_profile(DtypeClass::Uint16, custom)
        .unwrap();

    let uint8 = store.brightness_profile(DtypeClass::Uint8);
    assert_eq!(uint8, BrightnessProfile::new(0.0, 1.0, 255.0));
    assert_eq!(store.stored_profile(DtypeClass::Uint16), Some(custom));
}

#[test]
fn selection_survives_zoom() {
    let mut session = ViewerSession::new();
    session.switch_image(&image(64, 64, 1));
    session
        .selection_mut()
        .set_rect(ImageRect::new(8, 8, 24, 16).unwrap());
    let before = session.mapper().unwrap().rect_to_widget(ImageRect::new(8, 8, 24, 16).unwrap());

    session.zoom_mut().zoom_in_at(WidgetPoint::new(10.0, 10.0));
    assert_eq!(session.selection().rect(), ImageRect::new(8, 8, 24, 16));
    let after = session.mapper().unwrap().rect_to_widget(ImageRect::new(8, 8, 24, 16).unwrap());
    assert!((after.width() - 2.0 * before.width()).abs() < 1e-9);
}
