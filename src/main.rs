use interlock::{gen_svg_string, GridSpec, Mulberry32, Puzzle, Rect2, RenderingOpts, ScatterOptions};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Usage: interlock [rows] [cols] [seed]
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let arg = |i: usize, default: u32| -> u32 {
        args.get(i).and_then(|s| s.parse().ok()).unwrap_or(default)
    };
    let spec = GridSpec {
        rows: arg(0, 4).max(1) as usize,
        cols: arg(1, 6).max(1) as usize,
        ..GridSpec::default()
    };
    let seed = arg(2, 1);

    let mut rng = Mulberry32::new(seed);
    let mut puzzle = Puzzle::generate(&spec, &mut rng);
    let table = Rect2::from_xywh(
        0.0,
        0.0,
        spec.cols as f32 * spec.piece_width * 2.5,
        spec.rows as f32 * spec.piece_height * 2.5,
    );
    puzzle.scramble_rotations(&mut rng);
    puzzle.scatter(&table, &ScatterOptions::default(), &mut rng);
    info!(seed, rows = spec.rows, cols = spec.cols, "scattered puzzle");

    // Write the scattered puzzle to an SVG file
    let svg = gen_svg_string(&puzzle, &RenderingOpts::default(), 1.0);
    let path = "scattered.svg";
    match std::fs::write(path, svg) {
        Ok(()) => info!(path, "wrote svg"),
        Err(e) => error!(path, "couldn't write svg: {}", e),
    }
}
