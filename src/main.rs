use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use nanogen::config::Config;
use nanogen::generators::{GrapheneGenerator, StructureGenerator, SwntGenerator, UnrolledSwntGenerator};
use nanogen::io::{FormatConverter, StructureConverter, StructureFormat};
use nanogen::structures::{
    filter_ch_list, generate_ch_list_imax, ChiralType, Graphene, Handedness, Layers, PropertyFilter, Swnt,
    UnrolledSwnt,
};
use nanogen::utils::{logger, report};
use nanogen::Result;
use nalgebra::Vector3;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "nanogen")]
#[command(about = "Generate graphene and carbon nanotube structures")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct BasisArgs {
    /// Bond length in Angstroms (default from config)
    #[arg(long)]
    bond: Option<f64>,

    /// The two basis elements
    #[arg(long, num_args = 2, value_names = ["E1", "E2"], default_values = ["C", "C"])]
    basis: Vec<String>,
}

impl BasisArgs {
    fn elements(&self) -> (&str, &str) {
        match self.basis.as_slice() {
            [e1, e2] => (e1.as_str(), e2.as_str()),
            _ => ("C", "C"),
        }
    }

    fn bond(&self, config: &Config) -> f64 {
        self.bond.unwrap_or(config.bond)
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format: xyz or data (default from config)
    #[arg(long)]
    format: Option<StructureFormat>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File name; derived from the structure parameters when omitted
    #[arg(long)]
    fname: Option<String>,

    /// Keep only the atoms matching this selection
    #[arg(long)]
    select: Option<String>,

    /// Write coordinates as generated, without recentering
    #[arg(long)]
    no_center: bool,

    /// Print a coordination-number histogram for this cutoff (Angstroms)
    #[arg(long)]
    cn_cutoff: Option<f64>,

    /// Measure a distance (2 ids) or angle (3 ids) in the saved structure
    #[arg(long, value_delimiter = ',')]
    measure: Vec<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Graphene sheet(s) from the conventional or primitive cell
    Graphene {
        /// Armchair edge length (nm)
        #[arg(long, default_value_t = 10.0)]
        armchair: f64,

        /// Zigzag edge length (nm)
        #[arg(long, default_value_t = 10.0)]
        zigzag: f64,

        /// Use the primitive cell with this edge length (nm)
        #[arg(long, conflicts_with_all = ["armchair", "zigzag"])]
        primitive: Option<f64>,

        #[arg(long, default_value_t = 1)]
        nlayers: usize,

        /// Interlayer distance (Angstroms, default from config)
        #[arg(long)]
        layer_spacing: Option<f64>,

        /// Rotation increment between successive layers (degrees)
        #[arg(long, default_value_t = 0.0)]
        rotation: f64,

        /// Stack layers directly on top of each other instead of AB
        #[arg(long)]
        aa: bool,

        #[command(flatten)]
        basis: BasisArgs,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// AB-stacked bilayer graphene
    Bilayer {
        #[arg(long, default_value_t = 10.0)]
        armchair: f64,

        #[arg(long, default_value_t = 10.0)]
        zigzag: f64,

        /// Rotation of the top layer (degrees)
        #[arg(long, default_value_t = 0.0)]
        rotation: f64,

        #[arg(long)]
        layer_spacing: Option<f64>,

        #[command(flatten)]
        basis: BasisArgs,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// Single-walled nanotube along z
    Swnt {
        n: u32,
        m: u32,

        /// Number of unit cells along the axis
        #[arg(long, default_value_t = 1)]
        n3: u32,

        /// Tube length in nm; overrides --n3
        #[arg(long)]
        length: Option<f64>,

        #[command(flatten)]
        basis: BasisArgs,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// Nanotube unit cells unrolled into flat sheets
    Unrolled {
        n: u32,
        m: u32,

        #[arg(long, default_value_t = 1)]
        n1: u32,

        #[arg(long, default_value_t = 1)]
        n3: u32,

        #[arg(long, default_value_t = 1)]
        nlayers: usize,

        #[arg(long)]
        layer_spacing: Option<f64>,

        /// Lateral shift of odd layers along x (Angstroms)
        #[arg(long, default_value_t = 0.0)]
        layer_shift: f64,

        /// Rotation increment between successive layers (degrees)
        #[arg(long, default_value_t = 0.0)]
        rotation: f64,

        #[command(flatten)]
        basis: BasisArgs,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// List chiralities up to imax with their diameters and chiral angles
    Chiralities {
        #[arg(long, default_value_t = 10)]
        imax: u32,

        /// left or right
        #[arg(long)]
        handedness: Option<Handedness>,

        /// armchair, zigzag or chiral (repeatable)
        #[arg(long = "type")]
        types: Vec<ChiralType>,

        /// Property condition such as "dt>=1.0" (repeatable)
        #[arg(long)]
        filter: Vec<PropertyFilter>,
    },
    /// Convert a structure file between formats
    Convert { input: PathBuf, output: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("logger already installed: {}", e);
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let config = Config::load();
    config.validate()?;

    match command {
        Commands::Graphene {
            armchair,
            zigzag,
            primitive,
            nlayers,
            layer_spacing,
            rotation,
            aa,
            basis,
            out,
        } => {
            let (e1, e2) = basis.elements();
            let params = match primitive {
                Some(edge) => Graphene::primitive(edge)?,
                None => Graphene::conventional(armchair, zigzag)?,
            }
            .with_bond(basis.bond(&config))?
            .with_basis(e1, e2);
            let shift = if aa { Vector3::zeros() } else { params.ab_shift() };
            let layers = Layers::new(nlayers, layer_spacing.unwrap_or(config.layer_spacing))?
                .with_shift(shift)
                .with_rotation_increment(rotation, true);
            emit(GrapheneGenerator::new(params.with_layers(layers)), &out, &config)
        }
        Commands::Bilayer {
            armchair,
            zigzag,
            rotation,
            layer_spacing,
            basis,
            out,
        } => {
            let (e1, e2) = basis.elements();
            let params = Graphene::conventional(armchair, zigzag)?
                .with_bond(basis.bond(&config))?
                .with_basis(e1, e2);
            let spacing = layer_spacing.unwrap_or(config.layer_spacing);
            emit(GrapheneGenerator::bilayer(params, spacing, rotation, true)?, &out, &config)
        }
        Commands::Swnt {
            n,
            m,
            n3,
            length,
            basis,
            out,
        } => {
            let (e1, e2) = basis.elements();
            let mut params = Swnt::new(n, m)?.with_bond(basis.bond(&config))?.with_basis(e1, e2);
            params = match length {
                Some(nm) => params.with_tube_length(nm)?,
                None => params.with_n3(n3)?,
            };
            emit(SwntGenerator::new(params), &out, &config)
        }
        Commands::Unrolled {
            n,
            m,
            n1,
            n3,
            nlayers,
            layer_spacing,
            layer_shift,
            rotation,
            basis,
            out,
        } => {
            let (e1, e2) = basis.elements();
            let layers = Layers::new(nlayers, layer_spacing.unwrap_or(config.layer_spacing))?
                .with_shift(Vector3::new(layer_shift, 0.0, 0.0))
                .with_rotation_increment(rotation, true);
            let params = UnrolledSwnt::new(n, m)?
                .with_cells(n1, n3)?
                .with_bond(basis.bond(&config))?
                .with_basis(e1, e2)
                .with_layers(layers);
            emit(UnrolledSwntGenerator::new(params), &out, &config)
        }
        Commands::Chiralities {
            imax,
            handedness,
            types,
            filter,
        } => {
            let types = (!types.is_empty()).then_some(types.as_slice());
            let list = generate_ch_list_imax(0, imax, handedness, types);
            let list = filter_ch_list(&list, &filter, config.bond);
            println!("{:<10} {:<10} {:>10} {:>12} {:>8}", "(n,m)", "type", "dt (A)", "angle (deg)", "atoms");
            for ch in &list {
                println!(
                    "{:<10} {:<10} {:>10.4} {:>12.3} {:>8}",
                    ch.to_string(),
                    ch.chiral_type().to_string(),
                    ch.dt(config.bond),
                    ch.chiral_angle().to_degrees(),
                    ch.natoms_per_cell()
                );
            }
            info!("{} chiralities", list.len());
            Ok(())
        }
        Commands::Convert { input, output } => {
            FormatConverter::default().convert(&input, &output)?;
            info!("converted {} -> {}", input.display(), output.display());
            Ok(())
        }
    }
}

/// Generate, optionally select and analyze, then save and print a summary.
fn emit<G: StructureGenerator>(mut generator: G, out: &OutputArgs, config: &Config) -> Result<()> {
    generator.generate(true)?;
    let atoms = generator.atoms_mut();
    let params = config.neighbor_params();
    atoms.set_nn_number(params.number);
    atoms.set_nn_cutoff(params.cutoff)?;

    if let Some(selstr) = &out.select {
        let selected = atoms.select(selstr)?;
        if selected.is_empty() {
            warn!("selection '{}' matched no atoms", selstr);
        }
        *atoms = selected;
    }

    if let Some(rc) = out.cn_cutoff {
        let cns = atoms.query_coordination_numbers(params.number, rc)?;
        print!("{}", report::coordination_summary(&cns));
    }

    let comment = config.comment(&generator.description());
    // an explicit extension in --fname wins over the configured default
    let format = out.format.or_else(|| match &out.fname {
        Some(name) if StructureFormat::from_path(Path::new(name)).is_ok() => None,
        _ => Some(config.default_format),
    });
    let path = generator.save_with_comment(
        out.fname.as_deref(),
        out.output.as_deref(),
        format,
        config.center_centroid && !out.no_center,
        &comment,
    )?;
    print!("{}", report::structure_summary(generator.atoms(), &path.display().to_string()));
    if !out.measure.is_empty() {
        println!("{}", report::geometry_analysis(generator.atoms(), &out.measure));
    }
    Ok(())
}
