use std::env;
use std::path::PathBuf;

const SHADERS: [&str; 2] = ["shader.vert", "shader.frag"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shader_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?).join("shaders");
    for name in SHADERS {
        println!("cargo:rerun-if-changed={}", shader_dir.join(name).display());
    }

    #[cfg(feature = "spirv")]
    compile_spirv(&shader_dir)?;

    Ok(())
}

/// Compiles each GLSL stage to `$OUT_DIR/<name>.spv` for embedding.
#[cfg(feature = "spirv")]
fn compile_spirv(shader_dir: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    use shaderc::{CompileOptions, Compiler, EnvVersion, ShaderKind, TargetEnv};

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let compiler = Compiler::new().expect("shaderc compiler unavailable");
    let mut options = CompileOptions::new().expect("shaderc options unavailable");
    options.set_target_env(TargetEnv::OpenGL, EnvVersion::OpenGL4_5 as u32);

    for name in SHADERS {
        let kind = if name.ends_with(".vert") {
            ShaderKind::Vertex
        } else {
            ShaderKind::Fragment
        };
        let path = shader_dir.join(name);
        let source = std::fs::read_to_string(&path)?;
        let artifact = compiler.compile_into_spirv(&source, kind, name, "main", Some(&options))?;
        if artifact.get_num_warnings() > 0 {
            println!("cargo:warning={name}: {}", artifact.get_warning_messages());
        }
        std::fs::write(out_dir.join(format!("{name}.spv")), artifact.as_binary_u8())?;
    }
    Ok(())
}
