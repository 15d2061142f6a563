use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::Selection;
use super::types::{GraphSnapshot, NodeKind, Point, PositionMap, Surface};

/// Canvas fill behind everything.
pub const BACKGROUND: &str = "#0f172a";
/// Edge stroke color.
pub const EDGE_COLOR: &str = "#475569";
/// Edge stroke width.
pub const EDGE_WIDTH: f64 = 1.0;
/// Ring drawn around the selected node.
pub const OUTLINE_COLOR: &str = "#f8fafc";
/// Selection ring stroke width.
pub const OUTLINE_WIDTH: f64 = 2.0;
/// Node label fill.
pub const LABEL_COLOR: &str = "#cbd5e1";
/// Node label font.
pub const LABEL_FONT: &str = "10px sans-serif";
/// Fill for kinds without a palette entry.
pub const FALLBACK_COLOR: &str = "#6b7280";

/// Thoughts are drawn smaller than entities.
pub const THOUGHT_RADIUS: f64 = 8.0;
/// Radius of every non-thought node.
pub const NODE_RADIUS: f64 = 12.0;
/// Vertical offset of a label below its node's center.
pub const LABEL_GAP: f64 = 12.0;
/// Labels longer than this are cut and suffixed with `...`.
pub const LABEL_MAX_CHARS: usize = 15;

const PALETTE: &[(NodeKind, &str)] = &[
	(NodeKind::Thought, "#a78bfa"),
	(NodeKind::Person, "#60a5fa"),
	(NodeKind::Project, "#34d399"),
	(NodeKind::Topic, "#fbbf24"),
	(NodeKind::Entity, "#f472b6"),
];

/// Palette fill for `kind`.
pub fn node_color(kind: NodeKind) -> &'static str {
	PALETTE
		.iter()
		.find(|(k, _)| *k == kind)
		.map(|&(_, color)| color)
		.unwrap_or(FALLBACK_COLOR)
}

/// Drawn radius for `kind`.
pub fn node_radius(kind: NodeKind) -> f64 {
	if kind == NodeKind::Thought {
		THOUGHT_RADIUS
	} else {
		NODE_RADIUS
	}
}

/// One primitive against the 2d surface.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
	/// Background fill from the origin.
	FillRect {
		/// Width in surface units.
		width: f64,
		/// Height in surface units.
		height: f64,
		/// CSS color.
		color: &'static str,
	},
	/// Straight edge segment.
	Line {
		/// Start point.
		from: Point,
		/// End point.
		to: Point,
		/// CSS color.
		color: &'static str,
		/// Stroke width.
		width: f64,
	},
	/// Node body.
	FillCircle {
		/// Center point.
		center: Point,
		/// Circle radius.
		radius: f64,
		/// CSS color.
		color: &'static str,
	},
	/// Selection outline.
	StrokeCircle {
		/// Center point.
		center: Point,
		/// Circle radius.
		radius: f64,
		/// CSS color.
		color: &'static str,
		/// Stroke width.
		width: f64,
	},
	/// Node label.
	Text {
		/// Already truncated.
		text: String,
		/// Center of the text baseline.
		at: Point,
		/// CSS color.
		color: &'static str,
		/// CSS font shorthand.
		font: &'static str,
	},
}

/// Full draw pass. Holds no state between calls.
pub fn draw_commands(
	snapshot: &GraphSnapshot,
	positions: &PositionMap,
	selection: &Selection,
	surface: Surface,
) -> Vec<DrawCommand> {
	let mut commands = Vec::with_capacity(1 + snapshot.edges.len() + snapshot.nodes.len() * 3);
	commands.push(DrawCommand::FillRect {
		width: surface.width,
		height: surface.height,
		color: BACKGROUND,
	});

	// Dangling edges are expected (nodes outside the fetched page).
	for edge in &snapshot.edges {
		if let (Some(&from), Some(&to)) =
			(positions.get(&edge.source_id), positions.get(&edge.target_id))
		{
			commands.push(DrawCommand::Line {
				from,
				to,
				color: EDGE_COLOR,
				width: EDGE_WIDTH,
			});
		}
	}

	for node in &snapshot.nodes {
		let Some(&center) = positions.get(&node.id) else {
			continue;
		};
		let radius = node_radius(node.kind);
		commands.push(DrawCommand::FillCircle {
			center,
			radius,
			color: node_color(node.kind),
		});
		if selection.is_selected(&node.id) {
			commands.push(DrawCommand::StrokeCircle {
				center,
				radius,
				color: OUTLINE_COLOR,
				width: OUTLINE_WIDTH,
			});
		}
		commands.push(DrawCommand::Text {
			text: node.label.chars().take(LABEL_MAX_CHARS).collect(),
			at: Point::new(center.x, center.y + radius + LABEL_GAP),
			color: LABEL_COLOR,
			font: LABEL_FONT,
		});
	}
	commands
}

/// Replays draw commands onto a canvas context.
pub fn paint(commands: &[DrawCommand], ctx: &CanvasRenderingContext2d) {
	ctx.save();
	ctx.set_text_align("center");
	for command in commands {
		match command {
			DrawCommand::FillRect {
				width,
				height,
				color,
			} => {
				ctx.set_fill_style_str(color);
				ctx.fill_rect(0.0, 0.0, *width, *height);
			}
			DrawCommand::Line {
				from,
				to,
				color,
				width,
			} => {
				ctx.set_stroke_style_str(color);
				ctx.set_line_width(*width);
				ctx.begin_path();
				ctx.move_to(from.x, from.y);
				ctx.line_to(to.x, to.y);
				ctx.stroke();
			}
			DrawCommand::FillCircle {
				center,
				radius,
				color,
			} => {
				ctx.begin_path();
				let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
				ctx.set_fill_style_str(color);
				ctx.fill();
			}
			DrawCommand::StrokeCircle {
				center,
				radius,
				color,
				width,
			} => {
				ctx.begin_path();
				let _ = ctx.arc(center.x, center.y, *radius, 0.0, 2.0 * PI);
				ctx.set_stroke_style_str(color);
				ctx.set_line_width(*width);
				ctx.stroke();
			}
			DrawCommand::Text {
				text,
				at,
				color,
				font,
			} => {
				ctx.set_fill_style_str(color);
				ctx.set_font(font);
				let _ = ctx.fill_text(text, at.x, at.y);
			}
		}
	}
	ctx.restore();
}
