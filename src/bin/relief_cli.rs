#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("relief_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use relief_engine::geom::{PolyMesh, TriangleMesh};
    use relief_engine::{
        DEFAULT_PLANE_HEIGHT, FixtureRegistry, HeightImage, ImageLibrary, Plate, ReliefReport,
        ReliefRequest, build_relief,
    };
    use serde::Deserialize;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const USAGE: &str = r#"relief_cli (relief-engine)

USAGE:
  relief_cli defaults
  relief_cli run --image <png> --out-dir <dir> [options]
  relief_cli job <job.json>

OPTIONS (run):
  --image <path>         Height image; the plate is sized from its aspect
  --config <path>        Request JSON (missing fields use the defaults)
  --name <name>          Plate name (default: image file stem)
  --plane-height <h>     Plate height in units (default: 112)
  --out-dir <dir>        Write <name>.obj and one OBJ per fixture here
  --no-smooth            Export the solid without the smoothing stage
  --overwrite            Overwrite existing output files
  -h, --help             Show this help

JOB FILE:
  { "input_file_path": "<png>", "output_path": "<dir>",
    "output_name": "<name>", "plane_height": 112,
    "request": { ...request fields... } }
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "defaults" => {
                let text = ReliefRequest::default()
                    .to_json_pretty()
                    .map_err(|e| e.to_string())?;
                println!("{text}");
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "job" => cmd_job(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    struct Job {
        image: PathBuf,
        request: ReliefRequest,
        name: Option<String>,
        plane_height: f64,
        out_dir: PathBuf,
        smooth: bool,
        overwrite: bool,
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let mut image: Option<PathBuf> = None;
        let mut config: Option<PathBuf> = None;
        let mut name: Option<String> = None;
        let mut plane_height = DEFAULT_PLANE_HEIGHT;
        let mut out_dir: Option<PathBuf> = None;
        let mut smooth = true;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--image" => image = Some(PathBuf::from(args.value("--image")?)),
                "--config" => config = Some(PathBuf::from(args.value("--config")?)),
                "--name" => name = Some(args.value("--name")?),
                "--plane-height" => {
                    let raw = args.value("--plane-height")?;
                    plane_height = raw
                        .parse()
                        .map_err(|_| format!("invalid --plane-height `{raw}`"))?;
                }
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--no-smooth" => smooth = false,
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let image = image.ok_or("missing --image")?;
        let out_dir = out_dir.ok_or("missing --out-dir")?;
        let request = match config {
            Some(path) => {
                let text = fs::read_to_string(&path)
                    .map_err(|e| format!("read {}: {e}", path.display()))?;
                ReliefRequest::from_json(&text).map_err(|e| format!("{}: {e}", path.display()))?
            }
            None => ReliefRequest::default(),
        };

        build_and_write(&Job {
            image,
            request,
            name,
            plane_height,
            out_dir,
            smooth,
            overwrite,
        })
    }

    #[derive(Deserialize)]
    struct JobFile {
        input_file_path: PathBuf,
        output_path: PathBuf,
        #[serde(default)]
        output_name: Option<String>,
        #[serde(default = "default_plane_height")]
        plane_height: f64,
        #[serde(default)]
        request: ReliefRequest,
    }

    fn default_plane_height() -> f64 {
        DEFAULT_PLANE_HEIGHT
    }

    fn cmd_job(args: &mut Args) -> Result<(), String> {
        let path = PathBuf::from(args.value("job")?);
        let text =
            fs::read_to_string(&path).map_err(|e| format!("read {}: {e}", path.display()))?;
        let job: JobFile =
            serde_json::from_str(&text).map_err(|e| format!("{}: {e}", path.display()))?;
        job.request
            .validate()
            .map_err(|e| format!("{}: {e}", path.display()))?;

        build_and_write(&Job {
            image: job.input_file_path,
            request: job.request,
            name: job.output_name,
            plane_height: job.plane_height,
            out_dir: job.output_path,
            smooth: true,
            overwrite: true,
        })
    }

    fn build_and_write(job: &Job) -> Result<(), String> {
        let image = HeightImage::open(&job.image).map_err(|e| e.to_string())?;
        let name = job
            .name
            .clone()
            .unwrap_or_else(|| image.stem().to_owned());
        let mut plate = Plate::image_plane(&name, image.width(), image.height(), job.plane_height)
            .map_err(|e| e.to_string())?;

        let mut images = ImageLibrary::new();
        images.insert(image);
        let mut request = job.request.clone();
        if !job.smooth {
            request.smooth_levels = 0;
        }
        let mut fixtures = FixtureRegistry::new();
        let report = build_relief(&request, &mut plate, &images, &mut fixtures)
            .map_err(|e| e.to_string())?;
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }

        let solid = plate.evaluated_mesh().map_err(|e| e.to_string())?;

        fs::create_dir_all(&job.out_dir).map_err(|e| format!("create out dir: {e}"))?;
        let path = job.out_dir.join(format!("{name}.obj"));
        write_obj_file(&path, &solid.to_triangle_mesh(), &name, job.overwrite)?;
        eprintln!("wrote {}", path.display());

        for fixture in fixtures.iter() {
            let Some(mesh) = fixtures
                .world_mesh(fixture.id, &plate)
                .map_err(|e| e.to_string())?
            else {
                eprintln!("skipped {} (text)", fixture.name);
                continue;
            };
            let path = job.out_dir.join(format!("{}.obj", fixture.name));
            write_polygon_obj_file(&path, &mesh, &fixture.name, job.overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        print_report(&name, &report, &solid);
        Ok(())
    }

    fn print_report(name: &str, report: &ReliefReport, solid: &PolyMesh) {
        eprintln!(
            "{name}: {summary} | vertices={v} faces={f} | {diag}",
            summary = report.summary,
            v = solid.vertex_count(),
            f = solid.face_count(),
            diag = report.diagnostics,
        );
        eprintln!("stack: {}", report.stack.join(" -> "));
        if let Some(spikes) = report.spikes.as_ref() {
            eprintln!(
                "spikes: {} of {} candidates flattened",
                spikes.adjusted.len(),
                spikes.candidates
            );
        }
        if let Some(timing) = report.timing.as_ref() {
            eprintln!("timing: {:.3} ms", timing.total_ms());
        }
    }

    fn create_file(path: &Path, overwrite: bool) -> Result<BufWriter<File>, String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        Ok(BufWriter::new(file))
    }

    fn write_obj_file(path: &Path, mesh: &TriangleMesh, name: &str, overwrite: bool) -> Result<(), String> {
        if !mesh.has_valid_indices() {
            return Err(format!("mesh `{name}` has out-of-range indices"));
        }
        let mut w = create_file(path, overwrite)?;

        writeln!(w, "# relief-engine relief_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(uvs) = mesh.uvs.as_ref() {
            for uv in uvs.iter().copied() {
                writeln!(w, "vt {} {}", uv[0], uv[1]).map_err(|e| format!("write obj: {e}"))?;
            }
        }

        let has_uvs = mesh.uvs.is_some();
        for tri in mesh.indices.chunks_exact(3) {
            let a = tri[0] + 1;
            let b = tri[1] + 1;
            let c = tri[2] + 1;
            if has_uvs {
                writeln!(w, "f {a}/{a} {b}/{b} {c}/{c}")
            } else {
                writeln!(w, "f {a} {b} {c}")
            }
            .map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn write_polygon_obj_file(path: &Path, mesh: &PolyMesh, name: &str, overwrite: bool) -> Result<(), String> {
        let mut w = create_file(path, overwrite)?;

        writeln!(w, "# relief-engine relief_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;
        for p in &mesh.positions {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
        }
        for face in mesh.faces() {
            let indices: Vec<String> = face.vertices.iter().map(|v| (v + 1).to_string()).collect();
            writeln!(w, "f {}", indices.join(" ")).map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
