// CLI application
use clap::Parser;
use rasterhal_cli::commands::{encode_format, find_quirk, tile_sprite, FormatArgs, QuirkArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rasterhal")]
#[command(about = "Rasterizer core diagnostics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the vertex format word and vertex size for a set of draw flags
    Format {
        /// Vertices go through the transform pipeline
        #[arg(long)]
        transform: bool,

        /// Vertices carry normals
        #[arg(long)]
        light: bool,

        /// Vertices carry a diffuse colour
        #[arg(long)]
        diffuse: bool,

        /// Vertices carry a specular colour
        #[arg(long)]
        specular: bool,

        /// Blend weights per vertex (0 to 5)
        #[arg(long, default_value_t = 0)]
        weights: u32,

        /// Texture stages (0 to 8)
        #[arg(long, default_value_t = 0)]
        stages: usize,
    },
    /// Print the texture tiles of a sprite
    Tiles {
        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Smallest texture side
        #[arg(long, default_value_t = 8)]
        min: u32,

        /// Largest texture side
        #[arg(long, default_value_t = 256)]
        max: u32,

        /// Largest texture aspect ratio, 0 for unlimited
        #[arg(long, default_value_t = 8)]
        ratio: u32,
    },
    /// Look up a device in a driver quirk database
    Quirks {
        /// JSON quirk database
        #[arg(long)]
        db: PathBuf,

        #[arg(long, default_value = "")]
        vendor: String,

        #[arg(long, default_value = "")]
        renderer: String,

        #[arg(long, default_value = "")]
        version: String,

        #[arg(long, default_value = "")]
        device: String,

        /// Display colour depth
        #[arg(long, default_value_t = 32)]
        bpp: u32,

        /// Operating system (VXOS_* name), defaults to the host
        #[arg(long)]
        os: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Format {
            transform,
            light,
            diffuse,
            specular,
            weights,
            stages,
        } => {
            encode_format(&FormatArgs {
                transform,
                light,
                diffuse,
                specular,
                weights,
                stages,
            })?;
        }
        Commands::Tiles {
            width,
            height,
            min,
            max,
            ratio,
        } => {
            tile_sprite(width, height, min, max, ratio)?;
        }
        Commands::Quirks {
            db,
            vendor,
            renderer,
            version,
            device,
            bpp,
            os,
        } => {
            find_quirk(&QuirkArgs {
                db,
                vendor,
                renderer,
                version,
                device,
                bpp,
                os,
            })?;
        }
    }

    Ok(())
}
