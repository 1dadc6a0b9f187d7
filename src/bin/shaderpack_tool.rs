use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use shaderpack_patcher::expr::{compile, grammar, OperatorTable};
use shaderpack_patcher::functions::{FixedFrameTimer, FunctionContext, FunctionRegistry, UniformMap};
use shaderpack_patcher::patcher::{
    AlphaTest, FogMode, PatchParameters, ProgramSource, ShaderStage, VertexAttributes,
};
use shaderpack_patcher::program::{patch, Pipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Patch a single shader stage and print the result
    Patch {
        /// Shader path
        #[clap(value_parser)]
        shader_path: PathBuf,
        #[clap(long, value_parser, default_value = "vanilla")]
        pipeline: Pipeline,
        #[clap(long, value_parser)]
        stage: ShaderStage,
        /// off, nonzero or gt:<reference>
        #[clap(long, value_parser = parse_alpha, default_value = "off")]
        alpha: AlphaTest,
        /// Vertex attributes the draw lacks: color, texcoord, overlay, lightmap, normal
        #[clap(long, value_parser = parse_attribute, value_delimiter = ',')]
        without: Vec<VertexAttributes>,
        /// off, vertex or fragment
        #[clap(long, value_parser = parse_fog, default_value = "off")]
        fog: FogMode,
        /// Expand lines to quads
        #[clap(long)]
        lines: bool,
        /// The renderer supplies iris_ChunkOffset
        #[clap(long)]
        chunk_offset: bool,
    },
    /// Compile an expression and evaluate it for a number of frames
    Eval {
        #[clap(value_parser)]
        expression: String,
        /// A uniform, as name=<constant expression>
        #[clap(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        #[clap(long, value_parser, default_value_t = 1)]
        frames: u32,
        /// Seconds per frame
        #[clap(long, value_parser, default_value_t = 0.05)]
        frame_time: f32,
    },
}

fn parse_alpha(s: &str) -> Result<AlphaTest, String> {
    match s {
        "off" => Ok(AlphaTest::Off),
        "nonzero" => Ok(AlphaTest::NonZero),
        _ => s
            .strip_prefix("gt:")
            .and_then(|reference| reference.parse::<f32>().ok())
            .filter(|reference| reference.is_finite())
            .map(AlphaTest::GreaterThan)
            .ok_or_else(|| format!("invalid alpha test '{}'", s)),
    }
}

fn parse_attribute(s: &str) -> Result<VertexAttributes, String> {
    match s {
        "color" => Ok(VertexAttributes::COLOR),
        "texcoord" => Ok(VertexAttributes::TEXCOORD),
        "overlay" => Ok(VertexAttributes::OVERLAY),
        "lightmap" => Ok(VertexAttributes::LIGHTMAP),
        "normal" => Ok(VertexAttributes::NORMAL),
        _ => Err(format!("unknown vertex attribute '{}'", s)),
    }
}

fn parse_fog(s: &str) -> Result<FogMode, String> {
    match s {
        "off" => Ok(FogMode::Off),
        "vertex" => Ok(FogMode::PerVertex),
        "fragment" => Ok(FogMode::PerFragment),
        _ => Err(format!("unknown fog mode '{}'", s)),
    }
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim().to_owned(), value.to_owned()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Patch {
            shader_path,
            pipeline,
            stage,
            alpha,
            without,
            fog,
            lines,
            chunk_offset,
        } => {
            let source = std::fs::read_to_string(&shader_path)
                .with_context(|| format!("couldn't read {}", shader_path.display()))?;
            let name = shader_path
                .file_stem()
                .map_or_else(|| "shader".to_owned(), |s| s.to_string_lossy().into_owned());
            let program = ProgramSource::new(name).with_stage(stage, source);
            let parameters = match pipeline {
                Pipeline::Composite => PatchParameters::default(),
                _ => PatchParameters {
                    alpha,
                    is_lines: lines,
                    has_chunk_offset: chunk_offset,
                    attributes: without.into_iter().fold(VertexAttributes::all(), |acc, a| acc - a),
                    fog,
                },
            };
            let mut patched = patch(pipeline, &program, &parameters)?;
            let output = patched
                .remove(&stage)
                .ok_or_else(|| anyhow!("no {} stage was produced", stage))?;
            print!("{}", output);
        }
        Command::Eval {
            expression,
            vars,
            frames,
            frame_time,
        } => {
            let table = OperatorTable::default_table();
            let registry = FunctionRegistry::with_builtins();
            let timer = FixedFrameTimer(frame_time);

            let mut uniforms = UniformMap::new();
            for (name, value) in vars {
                let mut constant = compile(&value, table, &registry, &uniforms)
                    .with_context(|| format!("in the value of '{}'", name))?;
                let value = constant.evaluate(&FunctionContext::new(&uniforms, &timer));
                uniforms.set(name, value);
            }

            if frames == 0 {
                bail!("--frames must be at least 1");
            }
            let node = grammar::parse(&expression, table)?;
            let mut compiled = compile(&expression, table, &registry, &uniforms)?;
            println!("{}: {}", compiled.ty(), node);
            for frame in 0..frames {
                let value = compiled.evaluate(&FunctionContext::new(&uniforms, &timer));
                println!("frame {}: {}", frame, value);
            }
        }
    }
    Ok(())
}
