pub(crate) const CLEAR_COLOR: [u8; 4] = [16, 18, 24, 255];

/// Integer upscale factor that fits `source` into `target`, at least 1.
pub(crate) fn fit_factor(source: (u32, u32), target: (u32, u32)) -> u32 {
    let (source_width, source_height) = source;
    let (target_width, target_height) = target;
    if source_width == 0 || source_height == 0 {
        return 1;
    }
    (target_width / source_width)
        .min(target_height / source_height)
        .max(1)
}

/// Clears `frame` and draws the RGBA `source` nearest-neighbour upscaled and
/// centred. Transparent source pixels show the clear colour.
pub(crate) fn present_centered(
    frame: &mut [u8],
    frame_size: (u32, u32),
    source: &[u8],
    source_size: (u32, u32),
) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }

    let (frame_width, frame_height) = frame_size;
    let (source_width, source_height) = source_size;
    if source.len() < source_width as usize * source_height as usize * 4 {
        return;
    }
    let factor = fit_factor(source_size, frame_size);
    let drawn_width = i64::from(source_width) * i64::from(factor);
    let drawn_height = i64::from(source_height) * i64::from(factor);
    let offset_x = (i64::from(frame_width) - drawn_width) / 2;
    let offset_y = (i64::from(frame_height) - drawn_height) / 2;

    for y in 0..frame_height {
        let local_y = i64::from(y) - offset_y;
        if local_y < 0 || local_y >= drawn_height {
            continue;
        }
        let source_y = (local_y / i64::from(factor)) as usize;
        for x in 0..frame_width {
            let local_x = i64::from(x) - offset_x;
            if local_x < 0 || local_x >= drawn_width {
                continue;
            }
            let source_x = (local_x / i64::from(factor)) as usize;
            let source_index = (source_y * source_width as usize + source_x) * 4;
            let pixel = &source[source_index..source_index + 4];
            if pixel[3] == 0 {
                continue;
            }
            let frame_index = (y as usize * frame_width as usize + x as usize) * 4;
            frame[frame_index..frame_index + 4].copy_from_slice(pixel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_factor_uses_smaller_axis_and_never_zero() {
        assert_eq!(fit_factor((16, 8), (64, 64)), 4);
        assert_eq!(fit_factor((100, 100), (50, 50)), 1);
        assert_eq!(fit_factor((0, 0), (50, 50)), 1);
    }

    #[test]
    fn source_is_upscaled_and_centred() {
        let source = [
            255, 0, 0, 255, //
            0, 0, 0, 0,
        ];
        let mut frame = vec![0u8; 6 * 4 * 4];

        present_centered(&mut frame, (6, 4), &source, (2, 1));

        let pixel = |x: usize, y: usize| {
            let index = (y * 6 + x) * 4;
            [frame[index], frame[index + 1], frame[index + 2], frame[index + 3]]
        };
        // factor 3, drawn 6x3 at (0, 0)
        assert_eq!(pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(pixel(2, 2), [255, 0, 0, 255]);
        assert_eq!(pixel(3, 0), CLEAR_COLOR, "transparent source pixel");
        assert_eq!(pixel(0, 3), CLEAR_COLOR, "outside drawn area");
    }

    #[test]
    fn short_source_buffer_only_clears() {
        let mut frame = vec![0u8; 2 * 2 * 4];
        present_centered(&mut frame, (2, 2), &[1, 2, 3], (1, 1));
        assert!(frame.chunks_exact(4).all(|chunk| chunk == CLEAR_COLOR));
    }
}
