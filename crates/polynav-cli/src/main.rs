//! CLI utility for polynav

mod scene;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use polynav::debug::nav_mesh_to_svg;
use polynav::{NavMesh, NavMeshGenerator};
use polynav_path::{PathPoint, PathfindingAStar};

use crate::scene::Scene;

/// A CLI utility to generate navigation meshes from JSON scenes and to find paths on them
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a navigation mesh from a scene
    Build {
        /// Input scene file (JSON format)
        #[clap(long, value_parser)]
        scene: PathBuf,

        /// Output navigation mesh file (JSON format)
        #[clap(long, value_parser)]
        output: PathBuf,

        /// Optional top view drawing of the navigation mesh (SVG format)
        #[clap(long, value_parser)]
        svg: Option<PathBuf>,
    },

    /// Find a path on a navigation mesh
    FindPath {
        /// Input navigation mesh file (JSON format)
        #[clap(long, value_parser)]
        mesh: PathBuf,

        /// Start position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        start: Vec3,

        /// End position (x,y,z)
        #[clap(long, value_parser = parse_vector)]
        end: Vec3,

        /// Additional cost of each jump
        #[clap(long, default_value = "2.0")]
        jump_penalty: f32,

        /// Output path file
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
    },
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').collect();

    if parts.len() != 3 {
        return Err(format!("Vector must have 3 components, got {}", parts.len()));
    }

    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let z = parts[2].trim().parse::<f32>().map_err(|e| e.to_string())?;

    Ok(Vec3::new(x, y, z))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Build { scene, output, svg } => {
            build_nav_mesh(&scene, &output, svg.as_deref()).map(|_| ())
        }
        Commands::FindPath {
            mesh,
            start,
            end,
            jump_penalty,
            output,
        } => find_path(&mesh, start, end, jump_penalty, output.as_deref()).map(|_| ()),
    }
}

/// Build a navigation mesh from a scene
fn build_nav_mesh(scene_path: &Path, output: &Path, svg: Option<&Path>) -> Result<Arc<NavMesh>> {
    println!("Loading scene from {}...", scene_path.display());
    let scene = Scene::load(scene_path)?;
    println!("Scene loaded: {} entities", scene.entities.len());

    let mut world = scene.to_world()?;
    let mut generator =
        NavMeshGenerator::new(scene.config.clone()).context("Invalid navigation mesh configuration")?;

    println!("Building navigation mesh...");
    let nav_mesh = generator
        .generate(&mut world)
        .context("Failed to build navigation mesh")?;
    println!(
        "Navigation mesh built: {} polygons, {} triangles",
        nav_mesh.polygons().len(),
        nav_mesh.triangle_count()
    );

    println!("Saving navigation mesh to {}...", output.display());
    nav_mesh
        .save_to_json(output)
        .with_context(|| format!("Failed to save navigation mesh: {}", output.display()))?;

    if let Some(svg_path) = svg {
        println!("Drawing navigation mesh to {}...", svg_path.display());
        nav_mesh_to_svg(&nav_mesh)
            .write_to(svg_path)
            .with_context(|| format!("Failed to write SVG file: {}", svg_path.display()))?;
    }

    Ok(nav_mesh)
}

/// Find a path on a navigation mesh
fn find_path(
    mesh_path: &Path,
    start: Vec3,
    end: Vec3,
    jump_penalty: f32,
    output: Option<&Path>,
) -> Result<Vec<PathPoint>> {
    println!("Loading navigation mesh from {}...", mesh_path.display());
    let nav_mesh = NavMesh::load_from_json(mesh_path)
        .map_err(|e| anyhow!("Failed to load navigation mesh: {}", e))?;
    println!("Successfully loaded navigation mesh");

    println!("Finding path from {:?} to {:?}...", start, end);
    let pathfinding = PathfindingAStar::new(Arc::new(nav_mesh), jump_penalty);
    let path = pathfinding
        .find_path(start, end)
        .map_err(|e| anyhow!("Failed to find path: {}", e))?;
    println!("Found path with {} points", path.len());

    if let Some(output_path) = output {
        println!("Saving path to {}...", output_path.display());

        let mut file = File::create(output_path)
            .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

        writeln!(file, "# Path from {:?} to {:?}", start, end)?;
        writeln!(file, "# {} points", path.len())?;
        for path_point in &path {
            writeln!(file, "{}", format_path_point(path_point))?;
        }
    } else {
        println!("Path:");
        for (i, path_point) in path.iter().enumerate() {
            println!("{}: {}", i, format_path_point(path_point));
        }
    }

    Ok(path)
}

/// `x,y,z` followed by `,jump` on jump takeoff points
fn format_path_point(path_point: &PathPoint) -> String {
    let point = path_point.point;
    if path_point.jump {
        format!("{},{},{},jump", point.x, point.y, point.z)
    } else {
        format!("{},{},{}", point.x, point.y, point.z)
    }
}
