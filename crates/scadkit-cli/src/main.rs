//! scadkit CLI - Drive OpenSCAD from the shell

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use scadkit_core::config::{self, DEFAULT_COLORSCHEME, LIBRARIES_PATH_ENV, OPENSCAD_PATH_ENV};
use scadkit_core::{Config, ImageSize, Library, OpenScad, Workspace, export_mesh, library};
use scadkit_render::{CameraOverrides, RenderSettings, Renderer, render_views_matrix};

#[derive(Parser)]
#[command(name = "scadkit")]
#[command(about = "Write, render and export OpenSCAD models", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to the OpenSCAD executable
    #[arg(long, global = true, env = OPENSCAD_PATH_ENV)]
    openscad: Option<PathBuf>,

    /// Extra library directory (repeatable)
    #[arg(short = 'L', long, global = true)]
    library: Vec<PathBuf>,

    /// Directory for scripts and rendered files
    #[arg(short = 'C', long, global = true, env = "SCADKIT_WORKDIR", default_value = ".")]
    workdir: PathBuf,

    /// Preview image size
    #[arg(long, global = true, default_value = "800x600")]
    image_size: ImageSize,

    /// OpenSCAD color scheme
    #[arg(long, global = true, default_value = DEFAULT_COLORSCHEME)]
    colorscheme: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Save a script into the working directory
    Write {
        /// Script name (`.scad` is appended when missing)
        name: String,

        /// Read the content from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print a script from the working directory
    Cat {
        /// Script name
        name: String,
    },

    /// Render a single PNG preview
    Render {
        /// Script name
        script: String,

        /// Output image
        #[arg(short, long, default_value = "preview.png")]
        output: String,

        /// Rotation about X in degrees
        #[arg(long, allow_hyphen_values = true)]
        rx: Option<f32>,

        /// Rotation about Y in degrees
        #[arg(long, allow_hyphen_values = true)]
        ry: Option<f32>,

        /// Rotation about Z in degrees
        #[arg(long, allow_hyphen_values = true)]
        rz: Option<f32>,

        /// Camera distance
        #[arg(short, long)]
        distance: Option<f32>,
    },

    /// Render the 14-view matrix
    Matrix {
        /// Script name
        script: String,

        /// Output image
        #[arg(short, long, default_value = "views_matrix.png")]
        output: String,
    },

    /// Export a mesh (format from the output extension)
    Export {
        /// Script name
        script: String,

        /// Output mesh
        #[arg(short, long, default_value = "model.stl")]
        output: String,
    },

    /// List library roots and their contents
    Libs,

    /// List a directory inside the library roots
    Ls {
        /// Short (e.g. BOSL2) or absolute library path
        path: String,
    },

    /// Print a file from the library roots
    Show {
        /// Short (e.g. BOSL2/std.scad) or absolute library path
        path: String,
    },

    /// Print the resolved configuration and OpenSCAD version
    Doctor,
}

impl ConfigArgs {
    fn into_config(self) -> Config {
        let executable = config::find_executable(self.openscad.as_deref());

        let mut roots = self.library;
        if let Some(var) = std::env::var_os(LIBRARIES_PATH_ENV) {
            roots.extend(config::split_library_var(&var));
        }
        roots.extend(config::default_library_paths());

        Config::new(self.workdir)
            .with_executable(executable)
            .with_library_roots(roots)
            .with_image_size(self.image_size)
            .with_colorscheme(self.colorscheme)
    }
}

/// Everything a command needs, built once from the configuration
struct Session {
    config: Config,
    workspace: Workspace,
    openscad: OpenScad,
}

impl Session {
    fn open(config: Config) -> Result<Self> {
        let workspace = Workspace::open(&config.workdir).with_context(|| {
            format!("cannot open working directory {}", config.workdir.display())
        })?;
        let openscad = OpenScad::new(config.executable.clone(), workspace.root());
        Ok(Self {
            config,
            workspace,
            openscad,
        })
    }

    fn settings(&self, size: ImageSize) -> RenderSettings {
        RenderSettings {
            size,
            colorscheme: self.config.colorscheme.clone(),
            ..Default::default()
        }
    }

    fn library(&self) -> Library {
        Library::new(&self.config.library_roots)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let session = Session::open(cli.config.into_config())?;

    match cli.command {
        Commands::Write { name, input } => run_write(&session, &name, input)?,
        Commands::Cat { name } => {
            print!("{}", session.workspace.read_script(&name)?);
        }
        Commands::Render {
            script,
            output,
            rx,
            ry,
            rz,
            distance,
        } => {
            let overrides = CameraOverrides {
                rotation_x: rx,
                rotation_y: ry,
                rotation_z: rz,
                distance,
            };
            run_render(&session, &script, &output, &overrides)?;
        }
        Commands::Matrix { script, output } => run_matrix(&session, &script, &output)?,
        Commands::Export { script, output } => run_export(&session, &script, &output)?,
        Commands::Libs => run_libs(&session)?,
        Commands::Ls { path } => {
            let (dir, entries) = session.library().list_dir(&path)?;
            println!("Contents of {} ({}):", path, dir.display());
            if entries.is_empty() {
                println!("  (empty)");
            }
            for entry in entries {
                println!("  {entry}");
            }
        }
        Commands::Show { path } => {
            print!("{}", session.library().read_file(&path)?);
        }
        Commands::Doctor => run_doctor(&session),
    }

    Ok(())
}

fn run_write(session: &Session, name: &str, input: Option<PathBuf>) -> Result<()> {
    let content = match input {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("cannot read stdin")?,
    };

    let path = session.workspace.write_script(name, &content)?;
    println!("Saved {}", session.workspace.display_path(&path).display());
    Ok(())
}

fn run_render(
    session: &Session,
    script: &str,
    output: &str,
    overrides: &CameraOverrides,
) -> Result<()> {
    let script = session.workspace.existing_script(script)?;
    let output = session.workspace.output_path(output, "png")?;

    println!("Rendering {}...", session.workspace.display_path(&script).display());
    let renderer = Renderer::new(&session.openscad, session.settings(session.config.image_size));
    let preview = renderer.preview(&script, &output, overrides)?;

    if let Some(bounds) = &preview.bounds {
        println!("{bounds}");
    }
    println!("Camera: {}", preview.camera.to_arg());
    println!("Saved {}", session.workspace.display_path(&preview.path).display());
    Ok(())
}

fn run_matrix(session: &Session, script: &str, output: &str) -> Result<()> {
    let script = session.workspace.existing_script(script)?;
    let output = session.workspace.output_path(output, "png")?;

    println!("Rendering 14 views of {}...", session.workspace.display_path(&script).display());
    let renderer = Renderer::new(&session.openscad, session.settings(session.config.cell_size));
    let matrix = render_views_matrix(&renderer, &script, &output)?;

    println!("{matrix}");
    println!("Saved {}", session.workspace.display_path(&matrix.path).display());
    Ok(())
}

fn run_export(session: &Session, script: &str, output: &str) -> Result<()> {
    let script = session.workspace.existing_script(script)?;
    let output = session.workspace.output_path(output, "stl")?;

    let report = export_mesh(&session.openscad, &script, &output)?;
    println!("{report}");
    if !report.is_clean() {
        bail!("{} geometry warning(s)", report.geometry_warnings.len());
    }
    Ok(())
}

fn run_libs(session: &Session) -> Result<()> {
    let lib = session.library();
    if lib.roots().is_empty() {
        println!("No OpenSCAD library directories found. Set {LIBRARIES_PATH_ENV} or pass --library.");
        return Ok(());
    }

    for root in lib.roots() {
        println!("{}", root.display());
        for entry in library::list_entries(root)? {
            println!("  {entry}");
        }
    }
    Ok(())
}

fn run_doctor(session: &Session) {
    println!("Working directory: {}", session.workspace.root().display());
    match session.openscad.executable() {
        Some(path) => {
            println!("OpenSCAD: {}", path.display());
            match session.openscad.version() {
                Ok(version) => println!("Version: {version}"),
                Err(e) => println!("Version: unavailable ({e})"),
            }
        }
        None => println!("OpenSCAD: not found (set {OPENSCAD_PATH_ENV} or pass --openscad)"),
    }
    println!("Preview size: {}", session.config.image_size);
    println!("Matrix cell size: {}", session.config.cell_size);
    println!("Color scheme: {}", session.config.colorscheme);
    if session.config.library_roots.is_empty() {
        println!("Library roots: none");
    }
    for root in &session.config.library_roots {
        println!("Library root: {}", root.display());
    }
}
