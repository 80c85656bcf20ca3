// shaderlab: compile a shader document and print every pass

use std::fs;
use std::path::{Path, PathBuf};

use shaderlab::compiler::{compile_with_includes, PassEntry};
use shaderlab::config::CompilerConfig;
use shaderlab::include::{IncludeError, IncludeResolver};

/// Resolves include paths relative to the including document's directory.
struct FileIncludeResolver {
    root: PathBuf,
}

impl IncludeResolver for FileIncludeResolver {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        let full = self.root.join(path);
        fs::read_to_string(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IncludeError::NotFound {
                path: path.to_string(),
            },
            _ => IncludeError::Unreadable {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }
}

fn print_stage(label: &str, entry: Option<&str>, text: &str) {
    match entry {
        Some(entry) => println!("  [{}: {}]", label, entry),
        None => println!("  [{}: none]", label),
    }
    for line in text.lines() {
        println!("    {}", line);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::new().filter("SHADERLAB_LOG")).init();

    let args: Vec<String> = std::env::args().collect();
    let program_name = args.first().map(|s| s.as_str()).unwrap_or("shaderlab");

    let Some(input) = args.get(1) else {
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file.shader>", program_name);
        std::process::exit(1);
    };

    let path = Path::new(input);
    if !path.exists() {
        eprintln!("Error: File '{}' not found", input);
        std::process::exit(1);
    }

    let source = fs::read_to_string(path)?;
    let resolver = FileIncludeResolver {
        root: path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let config = CompilerConfig::default();

    let shader = match compile_with_includes(&source, &resolver, &config) {
        Ok(shader) => shader,
        Err(e) => {
            eprintln!("{}: {}", input, e);
            std::process::exit(1);
        }
    };

    println!("Shader \"{}\"", shader.name);
    for sub_shader in &shader.sub_shaders {
        println!("SubShader \"{}\"", sub_shader.name);
        for entry in &sub_shader.passes {
            let pass = match entry {
                PassEntry::Pass(pass) => pass,
                PassEntry::UsePass(target) => {
                    println!("UsePass \"{}\"", target);
                    continue;
                }
            };
            println!("Pass \"{}\"", pass.name);
            print_stage("vertex", pass.vert_entry.as_deref(), &pass.vert);
            print_stage("fragment", pass.frag_entry.as_deref(), &pass.frag);
            if !pass.render_states.is_empty() {
                println!("  [render states]");
                for (key, value) in &pass.render_states {
                    println!("    {} = {}", key, value);
                }
            }
        }
    }

    for diagnostic in &shader.diagnostics {
        eprintln!("{}: {}", input, diagnostic);
    }

    Ok(())
}
