//! Integration tests for the server state against a scripted interpreter

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use rmcp::ServerHandler;
use scadkit_core::{Config, Error, ImageSize, Interpreter, Result, RunOutput};
use scadkit_mcp::ScadMcpService;
use scadkit_mcp::state::ScadState;
use scadkit_mcp::tools::library::{format_directory, format_roots};
use scadkit_render::CameraOverrides;

const PNG_MAGIC: &[u8] = b"\x89PNG";

const WEDGE_STL: &str = "solid wedge
facet normal 0 0 1
  outer loop
    vertex -5 -5 0
    vertex 5 -5 0
    vertex 5 5 8
  endloop
endfacet
endsolid wedge
";

/// Fake OpenSCAD writing an STL or PNG depending on the output extension
#[derive(Default)]
struct FakeOpenScad {
    stderr: String,
    /// Fail STL exports the way OpenSCAD does for a 2D model
    flat: bool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeOpenScad {
    fn with_stderr(stderr: &str) -> Self {
        Self {
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }
}

impl FakeOpenScad {
    fn flat() -> Self {
        Self {
            flat: true,
            ..Default::default()
        }
    }
}

impl Interpreter for FakeOpenScad {
    fn run(&self, args: &[String]) -> Result<RunOutput> {
        self.calls.lock().unwrap().push(args.to_vec());

        let out = PathBuf::from(&args[1]);
        if self.flat && out.extension().is_some_and(|e| e == "stl") {
            return Ok(RunOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "ERROR: Current top level object is not a 3D object.\n".to_string(),
            });
        }
        match out.extension().and_then(|e| e.to_str()) {
            Some("stl") => std::fs::write(&out, WEDGE_STL)?,
            Some("png") => RgbaImage::from_pixel(12, 9, Rgba([200, 180, 40, 255]))
                .save(&out)
                .map_err(Error::from)?,
            _ => {}
        }

        Ok(RunOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: self.stderr.clone(),
        })
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    libs: PathBuf,
    state: ScadState,
    fake: Arc<FakeOpenScad>,
}

fn fixture_with(fake: FakeOpenScad) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let libs = dir.path().join("libraries");
    std::fs::create_dir_all(libs.join("BOSL2")).unwrap();
    std::fs::write(libs.join("BOSL2").join("std.scad"), "include <BOSL2/version.scad>\n").unwrap();
    std::fs::write(libs.join("BOSL2").join("README.md"), "# BOSL2\n").unwrap();
    std::fs::write(libs.join("MCAD.scad"), "// mcad\n").unwrap();
    std::fs::write(dir.path().join("secret.txt"), "nope").unwrap();

    let config = Config::new(dir.path().join("work"))
        .with_library_roots([&libs])
        .with_image_size(ImageSize::new(12, 9))
        .with_cell_size(ImageSize::new(12, 9));

    let fake = Arc::new(fake);
    let state = ScadState::with_interpreter(&config, fake.clone()).unwrap();
    let libs = libs.canonicalize().unwrap();
    Fixture { _dir: dir, libs, state, fake }
}

fn fixture() -> Fixture {
    fixture_with(FakeOpenScad::default())
}

fn write_part(state: &ScadState) -> PathBuf {
    state.write_script("part", "cube([10, 10, 8], center = true);").unwrap()
}

#[test]
fn written_script_reads_back_identically() {
    let fx = fixture();
    let content = "// ümlaut\r\nsphere(r = 5);\n\n";
    let path = fx.state.write_script("models/ball", content).unwrap();

    assert_eq!(path.extension().unwrap(), "scad");
    assert!(path.starts_with(fx.state.workspace().root()));
    assert_eq!(fx.state.read_script("models/ball.scad").unwrap(), content);

    // overwrite replaces the whole file
    fx.state.write_script("models/ball", "cube(1);").unwrap();
    assert_eq!(fx.state.read_script("models/ball").unwrap(), "cube(1);");
}

#[test]
fn scripts_cannot_escape_the_workspace() {
    let fx = fixture();
    let err = fx.state.write_script("../escape", "cube(1);").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));

    let err = fx.state.read_script("../secret.txt").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
}

#[test]
fn preview_returns_png_and_framing() {
    let fx = fixture();
    write_part(&fx.state);

    let image = fx
        .state
        .render_preview("part.scad", "preview.png", &CameraOverrides::default())
        .unwrap();

    assert!(image.png.starts_with(PNG_MAGIC));
    assert!(image.path.ends_with("preview.png"));
    assert!(image.summary.starts_with("Rendered preview.png"));
    assert!(image.summary.contains("12x9"));

    // probe + render
    let calls = fx.fake.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    // wedge spans (-5,-5,0)..(5,5,8); framed on its center at the default rotation
    assert!(calls[1].iter().any(|a| a.starts_with("--camera=0,0,4,55,0,25,")));
}

#[test]
fn preview_of_missing_script_fails_without_running() {
    let fx = fixture();
    let err = fx
        .state
        .render_preview("ghost", "preview.png", &CameraOverrides::default())
        .unwrap_err();
    assert!(matches!(err, Error::ScriptNotFound(_)));
    assert!(fx.fake.calls.lock().unwrap().is_empty());
}

#[test]
fn views_matrix_is_saved_in_workspace() {
    let fx = fixture();
    write_part(&fx.state);

    let image = fx.state.render_views_matrix("part", "views_matrix.png").unwrap();

    assert!(image.png.starts_with(PNG_MAGIC));
    assert!(image.summary.contains("Rendered 14 views"));
    assert!(image.summary.contains("Iso-BackRightBottom"));
    assert!(fx.state.workspace().root().join("views_matrix.png").is_file());
    assert_eq!(fx.fake.calls.lock().unwrap().len(), 15);
}

#[test]
fn clean_export_reports_success() {
    let fx = fixture();
    write_part(&fx.state);

    let report = fx.state.export_stl("part", "model.stl").unwrap();
    assert!(report.is_clean());
    assert!(report.to_string().starts_with("Successfully exported model.stl"));
    assert!(report.bytes > 0);
}

#[test]
fn export_output_gets_stl_extension() {
    let fx = fixture();
    write_part(&fx.state);

    let report = fx.state.export_stl("part", "out/model").unwrap();
    assert!(report.path.ends_with("out/model.stl"));
    assert!(report.path.is_file());
}

#[test]
fn empty_model_export_is_an_error() {
    let fx = fixture_with(FakeOpenScad::with_stderr(
        "WARNING: No top-level geometry to render\n",
    ));
    write_part(&fx.state);

    let err = fx.state.export_stl("part", "model.stl").unwrap_err();
    match err {
        Error::Export { stderr } => assert!(stderr.contains("No top-level geometry")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn manifold_warnings_are_flagged() {
    let fx = fixture_with(FakeOpenScad::with_stderr(
        "WARNING: Object may not be a valid 2-manifold and may need repair!\n",
    ));
    write_part(&fx.state);

    let report = fx.state.export_stl("part", "model.stl").unwrap();
    assert!(!report.is_clean());
    let text = report.to_string();
    assert!(!text.contains("Successfully"));
    assert!(text.contains("2-manifold"));
}

#[test]
fn outputs_never_overwrite_the_script() {
    let fx = fixture();
    let script = write_part(&fx.state);
    let original = std::fs::read_to_string(&script).unwrap();

    let err = fx.state.export_stl("part", "part.scad").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    let err = fx
        .state
        .render_preview("part", "part.scad", &CameraOverrides::default())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));
    let err = fx.state.render_views_matrix("part", "part.SCAD").unwrap_err();
    assert!(matches!(err, Error::InvalidPath(_)));

    assert_eq!(std::fs::read_to_string(&script).unwrap(), original);
    assert!(fx.fake.calls.lock().unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn script_suffix_is_checked_for_containment() {
    let fx = fixture();
    let victim = fx.libs.parent().unwrap().join("victim.scad");
    std::fs::write(&victim, "// untouched\n").unwrap();
    std::os::unix::fs::symlink(&victim, fx.state.workspace().root().join("foo.scad")).unwrap();

    for name in ["foo", "foo.scad"] {
        let err = fx.state.write_script(name, "cube(1);").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{name} should be rejected");
        let err = fx.state.read_script(name).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)), "{name} should be rejected");
    }
    assert_eq!(std::fs::read_to_string(&victim).unwrap(), "// untouched\n");
}

#[test]
fn flat_model_previews_but_does_not_export() {
    let fx = fixture_with(FakeOpenScad::flat());
    fx.state.write_script("outline", "circle(r = 10);").unwrap();

    let image = fx
        .state
        .render_preview("outline", "outline.png", &CameraOverrides::default())
        .unwrap();
    assert!(image.png.starts_with(PNG_MAGIC));
    assert!(image.summary.contains("2D model"));
    {
        let calls = fx.fake.calls.lock().unwrap();
        assert!(calls[1].contains(&"--viewall".to_string()));
        assert!(calls[1].contains(&"--autocenter".to_string()));
    }

    let err = fx.state.export_stl("outline", "outline.stl").unwrap_err();
    let text = err.to_string();
    assert!(text.contains("model is 2D"));
    assert!(!text.contains("empty"));
}

#[test]
fn library_short_name_and_absolute_path_resolve() {
    let fx = fixture();

    let (resolved, entries) = fx.state.list_library_directory("BOSL2").unwrap();
    assert_eq!(resolved, fx.libs.join("BOSL2"));
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["README.md", "std.scad"]);

    let absolute = fx.libs.join("BOSL2");
    let (same, _) = fx
        .state
        .list_library_directory(absolute.to_str().unwrap())
        .unwrap();
    assert_eq!(same, resolved);

    let text = format_directory("BOSL2", &resolved, &entries);
    assert!(text.contains("[FILE]  std.scad"));
    assert!(text.contains("[OTHER] README.md"));
}

#[test]
fn library_reads_are_confined_to_roots() {
    let fx = fixture();

    let source = fx.state.read_library_file("BOSL2/std.scad").unwrap();
    assert!(source.starts_with("include"));

    let err = fx.state.read_library_file("../secret.txt").unwrap_err();
    assert!(matches!(err, Error::AccessDenied(_)));

    let outside = fx.libs.parent().unwrap().join("secret.txt");
    let err = fx
        .state
        .read_library_file(outside.to_str().unwrap())
        .unwrap_err();
    assert!(matches!(err, Error::AccessDenied(_)));

    let err = fx.state.read_library_file("NoSuchLib/x.scad").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn list_libraries_shows_root_entries() {
    let fx = fixture();
    let listings = fx.state.list_libraries();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].root, fx.libs);

    let text = format_roots(&listings);
    assert!(text.contains(&format!("Path: {}", fx.libs.display())));
    assert!(text.contains("[DIR]   BOSL2"));
    assert!(text.contains("[FILE]  MCAD.scad"));
}

#[test]
fn server_info_advertises_tools() {
    let fx = fixture();
    let service = ScadMcpService::new(fx.state.clone());
    let info = service.get_info();

    assert_eq!(info.server_info.name, "scadkit-mcp");
    assert!(info.capabilities.tools.is_some());
    assert!(info.instructions.unwrap().contains("write_scad_script"));
}

#[test]
fn state_is_shareable_across_tasks() {
    fn check<T: Send + Sync + Clone + 'static>() {}
    check::<ScadState>();
}
