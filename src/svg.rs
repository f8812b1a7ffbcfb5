use itertools::Itertools;
use rgb::RGB8;
use simple_xml_builder::XMLElement;

use crate::{puzzle::Puzzle, utils::Rect2, V2};

/// Draws every piece of a puzzle where it currently lies, as an SVG string.  Returns an empty
/// `<svg>` element if the puzzle has no pieces.
pub fn gen_svg_string(puzzle: &Puzzle, opts: &RenderingOpts, scaling: f32) -> String {
    // Every outline, in pieces-layer space
    let outlines = puzzle
        .pieces()
        .indexed_iter()
        .filter_map(|(idx, piece)| {
            let clusters = puzzle.clusters();
            let cluster = clusters.get(clusters.cluster_of(idx)?)?;
            // Outlines have the cell's top-left at (pad, pad), and the cluster stores the cell's
            // top-left directly
            let cell_origin = clusters.local_position(idx)? - V2::new(piece.pad, piece.pad);
            let points = piece
                .outline()
                .into_iter()
                .map(|p| cluster.to_layer(cell_origin + p))
                .collect_vec();
            Some(points)
        })
        .collect_vec();

    let mut root = XMLElement::new("svg");
    let bbox = match Rect2::bbox(outlines.iter().flatten().copied()) {
        Some(b) => b,
        None => return root.to_string(),
    };
    let margin_vec = V2::new(opts.margin, opts.margin);
    let img_dimensions = (bbox.max() - bbox.min() + margin_vec * 2.0) * scaling;
    root.add_attribute("width", &img_dimensions.x.to_string());
    root.add_attribute("height", &img_dimensions.y.to_string());

    let outline_width_str = (opts.outline_width * scaling).to_string();
    for points in &outlines {
        let coord_string = points
            .iter()
            .map(|&v| {
                let v = (v - bbox.min() + margin_vec) * scaling;
                format!("{},{}", v.x, v.y)
            })
            .join(" ");

        let mut piece_elem = XMLElement::new("polygon");
        piece_elem.add_attribute("points", &coord_string);
        piece_elem.add_attribute("fill", &opts.piece_fill_color.to_string());
        piece_elem.add_attribute("stroke", &opts.outline_color.to_string());
        piece_elem.add_attribute("stroke-linejoin", "round");
        piece_elem.add_attribute("stroke-width", &outline_width_str);
        root.add_child(piece_elem);
    }

    root.to_string()
}

/// Configuration for how a puzzle should be rendered
#[derive(Debug, Clone)]
pub struct RenderingOpts {
    /// What color the pieces should be filled
    pub piece_fill_color: RGB8,
    /// The colour of the piece outlines.  Defaults to black
    pub outline_color: RGB8,
    /// Width of the outlines, in the same units as the pieces
    pub outline_width: f32,
    /// How many units of space will be reserved round the edge of the SVG file
    pub margin: f32,
}

impl Default for RenderingOpts {
    fn default() -> Self {
        Self {
            piece_fill_color: RGB8::new(240, 230, 210),
            outline_color: RGB8::new(0, 0, 0),
            outline_width: 1.0,
            margin: 10.0,
        }
    }
}
