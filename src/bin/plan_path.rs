//! Plans a path through a point-cloud world with TPS-RRT*
//!
//! Usage:
//!   cargo run --bin plan_path -- --obstacles data/obstacles_corridor.txt \
//!       --ptg-config data/ptgs.toml --start-pose "[0 0 0]" --goal-pose "[8.5 4 90]"

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use tps_rrt::common::KinematicState;
use tps_rrt::utils::render_tree::{self, RenderOptions};
use tps_rrt::utils::{load_obstacles_from_text_file, world_bbox_from, TimeProfiler, Visualizer};
use tps_rrt::{PlannerConfig, PlannerInput, PlannerResult, Pose2D, TpsRrtStar};

/// Margin [m] added around obstacles, start and goal for the world box
const WORLD_MARGIN: f64 = 1.0;
const PNG_SIZE: (u32, u32) = (1024, 768);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Obstacle point cloud, one `x y` pair per line
    #[arg(short, long)]
    obstacles: PathBuf,

    /// TOML file with the vehicle shape, PTGs and planner parameters
    #[arg(short, long)]
    ptg_config: PathBuf,

    /// Start pose as "[x y yaw_deg]"
    #[arg(short, long, allow_hyphen_values = true)]
    start_pose: Pose2D,

    /// Goal pose as "[x y yaw_deg]"
    #[arg(short, long, allow_hyphen_values = true)]
    goal_pose: Pose2D,

    /// Shortest accepted tree extension [m], 0.25 unless configured
    #[arg(long)]
    min_step_length: Option<f64>,

    /// Overrides the configured iteration count
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Overrides the configured random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Write the tree and path to this SVG file
    #[arg(long)]
    output_svg: Option<PathBuf>,

    /// Write the tree and path to this PNG file through gnuplot
    #[arg(long)]
    output_png: Option<PathBuf>,

    /// Open an interactive gnuplot window with the result
    #[arg(long)]
    show: bool,
}

fn run(args: Args) -> PlannerResult<()> {
    let config = PlannerConfig::load(&args.ptg_config)?;
    let ptgs = config.build_ptgs()?;
    for ptg in ptgs.iter() {
        info!("PTG: {}", ptg.description());
    }

    let obstacles = load_obstacles_from_text_file(&args.obstacles)?;
    let (bbox_min, bbox_max) = world_bbox_from(&obstacles, &args.start_pose, &args.goal_pose, WORLD_MARGIN);
    info!(points = obstacles.len(), min = %bbox_min, max = %bbox_max, "world loaded");

    let input = PlannerInput::new(
        KinematicState::new(args.start_pose),
        KinematicState::new(args.goal_pose),
        obstacles,
        bbox_min,
        bbox_max,
        ptgs,
    );

    let mut params = config.planner.clone();
    if let Some(step) = args.min_step_length {
        params.min_step_length = step;
    }
    if let Some(n) = args.max_iterations {
        params.max_iterations = n;
    }
    if let Some(seed) = args.seed {
        params.seed = seed;
    }

    let mut planner = TpsRrtStar::with_observer(params, Box::new(TimeProfiler::new()));
    let output = planner.plan(&input)?;

    if output.success {
        let path = output.best_path()?;
        info!(
            cost = output.best_cost,
            length = output.best_path_points()?.total_length(),
            nodes = path.len(),
            tree_size = output.motion_tree.len(),
            "path found"
        );
        for node in &path {
            info!("  #{} {}", node.id, node.data.state.pose);
        }
    } else {
        warn!(
            iterations = output.iterations,
            tree_size = output.motion_tree.len(),
            "no path found"
        );
    }

    if let Some(svg) = &args.output_svg {
        render_tree::save_svg(&input, &output, &RenderOptions::default(), svg)?;
        info!(file = %svg.display(), "SVG written");
    }
    let plot = || -> PlannerResult<Visualizer> {
        let mut vis = Visualizer::new();
        vis.set_title("TPS-RRT*");
        vis.plot_result(&input, &output)?;
        Ok(vis)
    };
    if let Some(png) = &args.output_png {
        plot()?.save_png(&png.to_string_lossy(), PNG_SIZE.0, PNG_SIZE.1)?;
        info!(file = %png.display(), "PNG written");
    }
    if args.show {
        plot()?.show()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
