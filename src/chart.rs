use iced::mouse;
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Stroke, Text};
use iced::{Color, Font, Point, Rectangle, Renderer, Size, Theme};

use crate::history::HistoryPoint;
use crate::theme::with_alpha;

const PAD_LEFT: f32 = 36.0;
const PAD_RIGHT: f32 = 8.0;
const PAD_TOP: f32 = 22.0;
const PAD_BOTTOM: f32 = 6.0;

/// Hover state: the snapped data-point index, not the raw pixel.
#[derive(Debug, Clone, Default)]
pub struct ChartState {
    pub hover_idx: Option<usize>,
}

/// Colors the chart needs from the active palette.
#[derive(Debug, Clone, Copy)]
pub struct ChartColors {
    pub bg: Color,
    pub border: Color,
    pub grid: Color,
    pub label: Color,
    pub text: Color,
}

/// Filled area chart of one history series, y-domain `[0, auto]`.
#[derive(Debug, Clone)]
pub struct AreaChart {
    pub points: Vec<HistoryPoint>,
    pub title: String,
    /// Tooltip suffix, e.g. "%" or " GB".
    pub unit: &'static str,
    pub color: Color,
    pub colors: ChartColors,
}

/// Upper bound of the y axis: the data maximum rounded up to a tick step.
/// An empty or all-zero series still gets a visible range.
fn auto_y_max(values: impl Iterator<Item = f32>) -> f32 {
    let max = values.filter(|v| v.is_finite()).fold(0.0f32, f32::max);
    if max <= 0.0 {
        return 1.0;
    }
    let step = nice_tick_step(max, 5);
    (max / step).ceil() * step
}

/// Map a cursor x inside the plot area to the nearest point index.
fn hover_index(x: f32, chart_w: f32, n: usize) -> Option<usize> {
    if n < 2 || chart_w <= 0.0 || x < PAD_LEFT || x > PAD_LEFT + chart_w {
        return None;
    }
    let frac = (x - PAD_LEFT) / chart_w;
    Some(((frac * (n - 1) as f32).round() as usize).min(n - 1))
}

/// Box width for a monospace tooltip, counted in glyphs rather than bytes.
fn tooltip_width(text: &str) -> f32 {
    text.chars().count() as f32 * 6.6 + 12.0
}

impl<Message: 'static> canvas::Program<Message> for AreaChart {
    type State = ChartState;

    fn update(
        &self,
        state: &mut Self::State,
        event: Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        let chart_w = bounds.width - PAD_LEFT - PAD_RIGHT;
        state.hover_idx = match event {
            Event::Mouse(mouse::Event::CursorMoved { .. }) => cursor
                .position_in(bounds)
                .and_then(|pos| hover_index(pos.x, chart_w, self.points.len())),
            Event::Mouse(mouse::Event::CursorLeft) => None,
            _ => return (canvas::event::Status::Ignored, None),
        };
        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let c = &self.colors;

        let chart_w = bounds.width - PAD_LEFT - PAD_RIGHT;
        let chart_h = bounds.height - PAD_TOP - PAD_BOTTOM;
        if chart_w <= 0.0 || chart_h <= 0.0 {
            return vec![frame.into_geometry()];
        }

        frame.fill(&Path::rectangle(Point::ORIGIN, bounds.size()), c.bg);
        let border = Path::rectangle(
            Point::new(0.5, 0.5),
            Size::new(bounds.width - 1.0, bounds.height - 1.0),
        );
        frame.stroke(&border, Stroke::default().with_color(c.border).with_width(0.5));

        let mut title = Text::from(self.title.to_uppercase());
        title.position = Point::new(PAD_LEFT, 4.0);
        title.color = c.label;
        title.size = 11.0.into();
        frame.fill_text(title);

        let y_max = auto_y_max(self.points.iter().map(|p| p.value));
        let y_of = |v: f32| PAD_TOP + chart_h * (1.0 - (v / y_max).clamp(0.0, 1.0));

        // Grid + y labels
        let step = nice_tick_step(y_max, 5);
        let mut val = 0.0f32;
        while val <= y_max + step * 0.001 {
            let y = y_of(val);
            frame.stroke(
                &Path::line(Point::new(PAD_LEFT, y), Point::new(PAD_LEFT + chart_w, y)),
                Stroke::default().with_color(c.grid).with_width(1.0),
            );
            let mut label = Text::from(if step >= 1.0 {
                format!("{val:.0}")
            } else {
                format!("{val:.1}")
            });
            label.position = Point::new(4.0, y - 5.0);
            label.color = c.label;
            label.size = 10.0.into();
            label.font = Font::MONOSPACE;
            frame.fill_text(label);
            val += step;
        }

        let n = self.points.len();
        if n < 2 {
            return vec![frame.into_geometry()];
        }
        let x_of = |i: usize| PAD_LEFT + (i as f32 / (n - 1) as f32) * chart_w;

        let mut area = canvas::path::Builder::new();
        area.move_to(Point::new(PAD_LEFT, PAD_TOP + chart_h));
        let mut line = canvas::path::Builder::new();
        for (i, p) in self.points.iter().enumerate() {
            let pt = Point::new(x_of(i), y_of(p.value));
            area.line_to(pt);
            if i == 0 {
                line.move_to(pt);
            } else {
                line.line_to(pt);
            }
        }
        area.line_to(Point::new(PAD_LEFT + chart_w, PAD_TOP + chart_h));
        area.close();
        frame.fill(&area.build(), with_alpha(self.color, 0.18));
        frame.stroke(&line.build(), Stroke::default().with_color(self.color).with_width(2.0));

        // Hover: crosshair, dot and "label  value" tooltip
        if let Some((idx, p)) = state.hover_idx.and_then(|idx| self.points.get(idx).map(|p| (idx, p))) {
            let x = x_of(idx);
            let y = y_of(p.value);
            frame.stroke(
                &Path::line(Point::new(x, PAD_TOP), Point::new(x, PAD_TOP + chart_h)),
                Stroke::default().with_color(with_alpha(c.text, 0.35)).with_width(1.0),
            );
            frame.fill(&Path::circle(Point::new(x, y), 4.0), self.color);

            let tooltip = format!("{}  {:.1}{}", p.label, p.value, self.unit);
            let text_w = tooltip_width(&tooltip);
            let tx = (x + 12.0).min(PAD_LEFT + chart_w - text_w).max(PAD_LEFT);
            let ty = PAD_TOP + 4.0;
            let tip = Path::rectangle(Point::new(tx - 4.0, ty - 2.0), Size::new(text_w, 18.0));
            frame.fill(&tip, with_alpha(c.bg, 0.95));
            frame.stroke(&tip, Stroke::default().with_color(with_alpha(self.color, 0.4)).with_width(0.8));

            let mut tt = Text::from(tooltip);
            tt.position = Point::new(tx, ty);
            tt.color = c.text;
            tt.size = 11.0.into();
            tt.font = Font::MONOSPACE;
            frame.fill_text(tt);
        }

        vec![frame.into_geometry()]
    }
}

/// Pick a "nice" tick step (1, 2, 5, 10, 20, 50, …) so that the range
/// is divided into at most `max_ticks` intervals.
fn nice_tick_step(range: f32, max_ticks: usize) -> f32 {
    let rough = range / max_ticks as f32;
    let mag = 10f32.powf(rough.log10().floor());
    let norm = rough / mag;
    let nice = if norm <= 1.0 { 1.0 } else if norm <= 2.0 { 2.0 } else if norm <= 5.0 { 5.0 } else { 10.0 };
    (nice * mag).max(f32::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nice_tick_step() {
        assert_eq!(nice_tick_step(100.0, 5), 20.0);
        assert_eq!(nice_tick_step(10.0, 5), 2.0);
        assert!((nice_tick_step(0.9, 5) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_auto_y_max() {
        assert_eq!(auto_y_max(std::iter::empty()), 1.0);
        assert_eq!(auto_y_max([0.0, 0.0].into_iter()), 1.0);
        assert_eq!(auto_y_max([12.0, 55.0, 90.0].into_iter()), 100.0);
        assert!(auto_y_max([3.2, 4.1].into_iter()) >= 4.1);
    }

    #[test]
    fn test_hover_index_snaps() {
        let w = 100.0;
        assert_eq!(hover_index(PAD_LEFT - 1.0, w, 5), None);
        assert_eq!(hover_index(PAD_LEFT, w, 5), Some(0));
        assert_eq!(hover_index(PAD_LEFT + 49.0, w, 5), Some(2));
        assert_eq!(hover_index(PAD_LEFT + w, w, 5), Some(4));
        assert_eq!(hover_index(PAD_LEFT + 10.0, w, 1), None);
    }

    #[test]
    fn test_tooltip_width_counts_chars() {
        // "·" and "°" are two bytes each in UTF-8
        let ascii = "12:00:01  45.0%";
        let wide = "12·00·01  45.0°";
        assert_eq!(ascii.chars().count(), wide.chars().count());
        assert_eq!(tooltip_width(ascii), tooltip_width(wide));
        assert_eq!(tooltip_width(""), 12.0);
    }
}
