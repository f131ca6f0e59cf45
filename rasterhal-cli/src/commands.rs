// CLI command handlers
use anyhow::{bail, Context, Result};
use rasterhal_core::quirks::{DeviceQuery, DriverProblem, DriverQuirkTable, OsKind};
use rasterhal_core::sprite::{self, TileLimits};
use rasterhal_core::vertex::{self, DrawFlags, TexCoordDims, VertexLayout, MAX_STAGES};
use std::fmt::Write;
use std::path::PathBuf;

pub struct FormatArgs {
    pub transform: bool,
    pub light: bool,
    pub diffuse: bool,
    pub specular: bool,
    pub weights: u32,
    pub stages: usize,
}

pub struct QuirkArgs {
    pub db: PathBuf,
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub device: String,
    pub bpp: u32,
    pub os: Option<String>,
}

pub fn draw_flags(args: &FormatArgs) -> Result<DrawFlags> {
    if args.weights > 5 {
        bail!("at most 5 blend weights are supported, got {}", args.weights);
    }
    if args.stages > MAX_STAGES {
        bail!("at most {} texture stages are supported, got {}", MAX_STAGES, args.stages);
    }

    let mut flags = DrawFlags::empty().with_stages(args.stages);
    flags.set(DrawFlags::TRANSFORM, args.transform);
    flags.set(DrawFlags::LIGHT, args.light);
    flags.set(DrawFlags::DIFFUSE, args.diffuse);
    flags.set(DrawFlags::SPECULAR, args.specular);
    if args.weights > 0 {
        flags |= DrawFlags::from_bits_retain(DrawFlags::WEIGHTS1.bits() << (args.weights - 1));
    }
    Ok(flags)
}

pub fn format_report(args: &FormatArgs) -> Result<String> {
    let flags = draw_flags(args)?;
    let (format, size) = vertex::encode_format(flags, TexCoordDims::default());
    let layout = VertexLayout::new(format);

    let mut out = String::new();
    writeln!(out, "Format: 0x{:08X}", format.bits())?;
    writeln!(out, "Vertex size: {} bytes", size)?;
    let attributes = [
        ("position", layout.position),
        ("weights", layout.weights),
        ("normal", layout.normal),
        ("point size", layout.point_size),
        ("diffuse", layout.diffuse),
        ("specular", layout.specular),
    ];
    for (name, slot) in attributes {
        if let Some(slot) = slot {
            writeln!(out, "  {:<10} @ {:>3} ({} bytes)", name, slot.offset, slot.size)?;
        }
    }
    for (stage, slot) in layout.tex_coords.iter().enumerate() {
        writeln!(out, "  texcoord{}  @ {:>3} ({} bytes)", stage, slot.offset, slot.size)?;
    }
    Ok(out)
}

pub fn encode_format(args: &FormatArgs) -> Result<()> {
    log::info!(
        "Encoding format: transform={}, light={}, weights={}, stages={}",
        args.transform,
        args.light,
        args.weights,
        args.stages
    );
    print!("{}", format_report(args)?);
    Ok(())
}

pub fn tiles_report(width: u32, height: u32, min: u32, max: u32, ratio: u32) -> Result<String> {
    let limits = TileLimits {
        min_width: min,
        max_width: max,
        min_height: min,
        max_height: max,
        max_ratio: ratio,
        ..Default::default()
    };
    let tiles = sprite::tile_sprite(width, height, &limits)
        .with_context(|| format!("Failed to tile a {}x{} sprite", width, height))?;

    let mut out = String::new();
    writeln!(out, "Sprite {}x{}: {} tiles", width, height, tiles.len())?;
    for tile in &tiles {
        writeln!(
            out,
            "  ({:>5}, {:>5}) {:>4}x{:<4} in {:>4}x{:<4}",
            tile.x, tile.y, tile.w, tile.h, tile.sw, tile.sh
        )?;
    }
    Ok(out)
}

pub fn tile_sprite(width: u32, height: u32, min: u32, max: u32, ratio: u32) -> Result<()> {
    log::info!(
        "Tiling {}x{} with textures {}..{}, ratio {}",
        width,
        height,
        min,
        max,
        ratio
    );
    print!("{}", tiles_report(width, height, min, max, ratio)?);
    Ok(())
}

pub fn quirk_report(args: &QuirkArgs, table: &DriverQuirkTable) -> Result<String> {
    let os = match &args.os {
        Some(name) => name.parse::<OsKind>()?,
        None => OsKind::current(),
    };
    let query = DeviceQuery {
        vendor: &args.vendor,
        renderer: &args.renderer,
        version: &args.version,
        device_desc: &args.device,
        bpp: args.bpp,
        os,
    };

    let mut out = String::new();
    match table.find(&query) {
        Some(problem) => describe_problem(&mut out, problem)?,
        None => writeln!(out, "No known problem")?,
    }
    Ok(out)
}

fn describe_problem(out: &mut String, problem: &DriverProblem) -> Result<()> {
    writeln!(out, "Known problem:")?;
    if !problem.vendor.is_empty() {
        writeln!(out, "  Vendor: {}", problem.vendor)?;
    }
    if !problem.renderer.is_empty() {
        writeln!(out, "  Renderer: {}", problem.renderer)?;
    }
    if !problem.device_desc.is_empty() {
        writeln!(out, "  Device: {}", problem.device_desc)?;
    }
    if !problem.version.is_empty() {
        writeln!(out, "  Version: {} ({:?})", problem.version, problem.version_rule)?;
    }
    if problem.clamp_to_edge_bug {
        writeln!(out, "  Clamp-to-edge addressing is broken")?;
    }
    if problem.max_texture_width > 0 || problem.max_texture_height > 0 {
        writeln!(
            out,
            "  Texture size limited to {}x{}",
            problem.max_texture_width, problem.max_texture_height
        )?;
    }
    for format in &problem.affected_formats {
        writeln!(out, "  Unusable format: {:?}", format)?;
    }
    let os: Vec<&str> = problem.os.iter().map(|os| os.name()).collect();
    writeln!(out, "  Systems: {}", os.join(", "))?;
    Ok(())
}

pub fn find_quirk(args: &QuirkArgs) -> Result<()> {
    let table = DriverQuirkTable::load(&args.db)?;
    log::info!("Loaded {} quirk records from {}", table.len(), args.db.display());
    print!("{}", quirk_report(args, &table)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_args() -> FormatArgs {
        FormatArgs {
            transform: true,
            light: true,
            diffuse: false,
            specular: false,
            weights: 0,
            stages: 1,
        }
    }

    #[test]
    fn standard_vertex_report() {
        let report = format_report(&format_args()).unwrap();
        assert!(report.contains("Format: 0x00000112"));
        assert!(report.contains("Vertex size: 32 bytes"));
        assert!(report.contains("texcoord0"));
    }

    #[test]
    fn weights_map_to_one_hot_flags() {
        let args = FormatArgs {
            weights: 3,
            ..format_args()
        };
        assert_eq!(draw_flags(&args).unwrap().weight_count(), 3);
        let args = FormatArgs {
            weights: 6,
            ..format_args()
        };
        assert!(draw_flags(&args).is_err());
    }

    #[test]
    fn tiles_report_lists_every_tile() {
        let report = tiles_report(1000, 600, 8, 256, 8).unwrap();
        assert!(report.starts_with("Sprite 1000x600: 12 tiles"));
        assert_eq!(report.lines().count(), 13);
        assert!(tiles_report(0, 10, 8, 256, 8).is_err());
    }

    #[test]
    fn quirk_lookup() {
        let table = DriverQuirkTable::from_json(
            r#"[{"Company": "NVIDIA", "UpToVersion": "6.14.10", "Os": ["VXOS_WINXP"]}]"#,
        )
        .unwrap();
        let mut args = QuirkArgs {
            db: PathBuf::new(),
            vendor: "NVIDIA".to_string(),
            renderer: "GeForce X".to_string(),
            version: "6.14.9".to_string(),
            device: String::new(),
            bpp: 32,
            os: Some("VXOS_WINXP".to_string()),
        };
        let report = quirk_report(&args, &table).unwrap();
        assert!(report.contains("Vendor: NVIDIA"));
        assert!(report.contains("Systems: VXOS_WINXP"));

        args.version = "6.14.11".to_string();
        assert_eq!(quirk_report(&args, &table).unwrap(), "No known problem\n");

        args.os = Some("VXOS_AMIGA".to_string());
        assert!(quirk_report(&args, &table).is_err());
    }
}
