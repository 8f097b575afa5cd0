/// Text metrics at the working font size.
pub trait TextMeasure {
    fn line_width(&self, line: &str) -> f32;
    /// Height of one line box, top of ascent to bottom of descent.
    fn line_height(&self) -> f32;
    /// Distance from the top of the line box down to the baseline.
    fn ascent(&self) -> f32;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinePlacement {
    pub text: String,
    pub x: f32,
    pub top: f32,
    pub baseline: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub lines: Vec<LinePlacement>,
}

/// Stacks `lines` top to bottom with `spacing` between consecutive lines.
///
/// All values are working-resolution pixels. An axis with no anchor is
/// centred on the canvas; the other axis keeps its anchor.
pub fn layout_block(
    lines: &[&str],
    measure: &impl TextMeasure,
    canvas_w: f32,
    canvas_h: f32,
    spacing: f32,
    anchor_x: Option<f32>,
    anchor_y: Option<f32>,
) -> BlockLayout {
    let line_height = measure.line_height();
    let widths = lines
        .iter()
        .map(|line| measure.line_width(line))
        .collect::<Vec<_>>();
    let block_w = widths.iter().copied().fold(0.0, f32::max);
    let block_h = if lines.is_empty() {
        0.0
    } else {
        line_height * lines.len() as f32 + spacing * (lines.len() - 1) as f32
    };

    let x = anchor_x.unwrap_or((canvas_w - block_w) / 2.0);
    let y = anchor_y.unwrap_or((canvas_h - block_h) / 2.0);

    let mut placements = Vec::with_capacity(lines.len());
    let mut top = y;
    for (line, width) in lines.iter().zip(widths) {
        placements.push(LinePlacement {
            text: (*line).to_string(),
            x,
            top,
            baseline: top + measure.ascent(),
            width,
            height: line_height,
        });
        top += line_height + spacing;
    }

    BlockLayout {
        x,
        y,
        width: block_w,
        height: block_h,
        lines: placements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is `advance` wide; lines are `height` tall.
    struct FixedMeasure {
        advance: f32,
        height: f32,
    }

    impl TextMeasure for FixedMeasure {
        fn line_width(&self, line: &str) -> f32 {
            line.chars().count() as f32 * self.advance
        }

        fn line_height(&self) -> f32 {
            self.height
        }

        fn ascent(&self) -> f32 {
            self.height * 0.8
        }
    }

    const MEASURE: FixedMeasure = FixedMeasure {
        advance: 10.0,
        height: 40.0,
    };

    #[test]
    fn single_line_is_centred() {
        let block = layout_block(&["Believe"], &MEASURE, 800.0, 600.0, 60.0, None, None);
        assert_eq!(block.width, 70.0);
        assert_eq!(block.height, 40.0);
        let centre_x = block.x + block.width / 2.0;
        let centre_y = block.y + block.height / 2.0;
        assert_eq!(centre_x, 400.0);
        assert_eq!(centre_y, 300.0);
    }

    #[test]
    fn stacked_height_counts_spacing_between_lines_only() {
        let lines = ["a", "bb", "ccc", "dddd"];
        let spacing = 12.0;
        let block = layout_block(&lines, &MEASURE, 500.0, 500.0, spacing, None, None);
        assert_eq!(block.height, 4.0 * 40.0 + 3.0 * spacing);
        for pair in block.lines.windows(2) {
            assert_eq!(pair[1].top - pair[0].top, 40.0 + spacing);
        }
        let last = block.lines.last().unwrap();
        assert_eq!(last.top + last.height - block.y, block.height);
    }

    #[test]
    fn block_width_is_widest_line() {
        let block = layout_block(&["ab", "abcdef", "abc"], &MEASURE, 500.0, 500.0, 0.0, None, None);
        assert_eq!(block.width, 60.0);
        assert!(block.lines.iter().all(|line| line.x == block.x));
    }

    #[test]
    fn explicit_anchor_is_used_as_is() {
        let block = layout_block(&["x", "y"], &MEASURE, 500.0, 500.0, 5.0, Some(600.0), Some(30.0));
        assert_eq!(block.lines[0].x, 600.0);
        assert_eq!(block.lines[0].top, 30.0);
        assert_eq!(block.lines[0].baseline, 30.0 + 32.0);
        assert_eq!(block.lines[1].top, 75.0);
    }

    #[test]
    fn missing_axis_is_centred_and_given_axis_kept() {
        let only_x = layout_block(&["abcd"], &MEASURE, 400.0, 200.0, 0.0, Some(12.0), None);
        assert_eq!(only_x.x, 12.0);
        assert_eq!(only_x.y, 80.0);

        let only_y = layout_block(&["abcd"], &MEASURE, 400.0, 200.0, 0.0, None, Some(7.0));
        assert_eq!(only_y.x, 180.0);
        assert_eq!(only_y.y, 7.0);
    }

    #[test]
    fn oversized_block_centres_with_negative_origin() {
        let block = layout_block(&["abcdefghij"], &MEASURE, 50.0, 20.0, 0.0, None, None);
        assert_eq!(block.x, -25.0);
        assert_eq!(block.y, -10.0);
    }

    #[test]
    fn empty_line_keeps_its_slot() {
        let block = layout_block(&["top", "", "bottom"], &MEASURE, 500.0, 500.0, 10.0, None, None);
        assert_eq!(block.lines.len(), 3);
        assert_eq!(block.lines[1].width, 0.0);
        assert_eq!(block.lines[2].top - block.lines[0].top, 2.0 * 50.0);
    }
}
