/// Where and how large an image is drawn on a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    /// Whether `width`/`height` differ from the source and a resize is needed.
    pub scaled: bool,
}

impl Placement {
    fn unscaled(image_w: u32, image_h: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image_w,
            height: image_h,
            scaled: false,
        }
    }
}

/// Fit an image to the screen without cropping.
///
/// With `scale` the image fills the binding dimension: width when the image
/// is wider than the screen's aspect, height when narrower, both (a stretch)
/// when the aspects are exactly equal. With `center` the image is offset by
/// half the leftover space along the axis the same aspect comparison picks.
/// The dependent dimension truncates but never below one pixel, so a
/// sliver image still yields a drawable placement.
pub fn compute_placement(
    screen_w: u32,
    screen_h: u32,
    image_w: u32,
    image_h: u32,
    scale: bool,
    center: bool,
) -> Placement {
    if screen_w == 0 || screen_h == 0 || image_w == 0 || image_h == 0 {
        return Placement::unscaled(image_w, image_h);
    }

    let screen_aspect = f64::from(screen_w) / f64::from(screen_h);
    let image_aspect = f64::from(image_w) / f64::from(image_h);
    let mut placement = Placement::unscaled(image_w, image_h);

    if scale {
        let (w, h) = if screen_aspect < image_aspect {
            (screen_w, ((f64::from(screen_w) / image_aspect) as u32).max(1))
        } else if screen_aspect > image_aspect {
            (((f64::from(screen_h) * image_aspect) as u32).max(1), screen_h)
        } else {
            (screen_w, screen_h)
        };
        placement.width = w;
        placement.height = h;
        placement.scaled = true;
    }

    // Centering re-derives the bound from the aspects, independent of scaling.
    if center {
        if screen_aspect < image_aspect {
            placement.y = (i64::from(screen_h) - i64::from(placement.height)).div_euclid(2);
        } else if screen_aspect > image_aspect {
            placement.x = (i64::from(screen_w) - i64::from(placement.width)).div_euclid(2);
        }
    }

    placement
}

/// Offset that centers an `inner` box within an `outer` one; negative when it overflows.
pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (i64, i64) {
    let ox = (i64::from(outer_w) - i64::from(inner_w)).div_euclid(2);
    let oy = (i64::from(outer_h) - i64::from(inner_h)).div_euclid(2);
    (ox, oy)
}
