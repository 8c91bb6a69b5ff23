//! OpenGL rendering backend
//!
//! Draws titlebar textures and fills through a single textured-quad program.
//! Rounded corners are cut in the fragment shader with `discard`, which also
//! keeps the cut-out pixels out of the stencil buffer when writing masks.
//!
//! The caller owns the GL context: it must be current and `gl::load_with`
//! must have run before [`GlRenderer::new`].

use std::collections::HashSet;
use std::ffi::CString;
use std::ptr;

use anyhow::{Context, Result, bail};
use tracing::{info, trace, warn};

use super::{Color, PixelBuffer, PixelFormat, Renderer, TextureId};
use crate::geometry::Rect;

const VERTEX_SHADER: &str = r#"
    #version 330 core
    layout (location = 0) in vec2 aPos;
    layout (location = 1) in vec2 aTexCoord;

    uniform vec2 uPosition;
    uniform vec2 uSize;

    out vec2 TexCoord;

    void main() {
        vec2 pos = aPos * uSize + uPosition;
        gl_Position = vec4(pos.x, pos.y, 0.0, 1.0);
        TexCoord = aTexCoord;
    }
"#;

const FRAGMENT_SHADER: &str = r#"
    #version 330 core
    out vec4 FragColor;

    in vec2 TexCoord;

    uniform sampler2D uTexture;
    uniform vec4 uColor;
    uniform float uOpacity;
    uniform vec2 uRectSize;
    uniform float uRadius;

    void main() {
        if (uRadius > 0.0) {
            vec2 p = TexCoord * uRectSize;
            vec2 q = abs(p - uRectSize * 0.5) - (uRectSize * 0.5 - vec2(uRadius));
            if (length(max(q, 0.0)) - uRadius > 0.0) {
                discard;
            }
        }
        // premultiplied in, premultiplied out
        FragColor = texture(uTexture, TexCoord) * uColor * uOpacity;
    }
"#;

/// Unit quad: position (vec2) and texcoord (vec2), flipped so texture row 0 is on top
const QUAD: [f32; 16] = [
    0.0, 0.0, 0.0, 1.0,
    1.0, 0.0, 1.0, 1.0,
    1.0, 1.0, 1.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
];

struct Uniforms {
    position: i32,
    size: i32,
    texture: i32,
    color: i32,
    opacity: i32,
    rect_size: i32,
    radius: i32,
}

impl Uniforms {
    unsafe fn locate(program: u32) -> Self {
        let get = |name: &[u8]| unsafe { gl::GetUniformLocation(program, name.as_ptr() as *const _) };
        Self {
            position: get(b"uPosition\0"),
            size: get(b"uSize\0"),
            texture: get(b"uTexture\0"),
            color: get(b"uColor\0"),
            opacity: get(b"uOpacity\0"),
            rect_size: get(b"uRectSize\0"),
            radius: get(b"uRadius\0"),
        }
    }
}

/// OpenGL renderer for titlebars
pub struct GlRenderer {
    program: u32,
    vao: u32,
    vbo: u32,
    uniforms: Uniforms,
    white_texture: u32, // 1x1 white texture for solid color fills
    textures: HashSet<u32>,
    viewport: (f32, f32),
}

impl GlRenderer {
    /// Set up the program and quad buffers for a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let program = Self::create_shader_program()?;

        unsafe {
            let mut vao = 0;
            let mut vbo = 0;
            gl::GenVertexArrays(1, &mut vao);
            gl::GenBuffers(1, &mut vbo);

            gl::BindVertexArray(vao);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (QUAD.len() * std::mem::size_of::<f32>()) as isize,
                QUAD.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            let stride = 4 * std::mem::size_of::<f32>() as i32;
            gl::VertexAttribPointer(0, 2, gl::FLOAT, gl::FALSE, stride, ptr::null());
            gl::EnableVertexAttribArray(0);
            gl::VertexAttribPointer(1, 2, gl::FLOAT, gl::FALSE, stride, (2 * std::mem::size_of::<f32>()) as *const _);
            gl::EnableVertexAttribArray(1);
            gl::BindVertexArray(0);

            let mut white_texture = 0;
            gl::GenTextures(1, &mut white_texture);
            gl::BindTexture(gl::TEXTURE_2D, white_texture);
            let white_pixel: [u8; 4] = [255, 255, 255, 255];
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                1,
                1,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                white_pixel.as_ptr() as *const _,
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);
            gl::BindTexture(gl::TEXTURE_2D, 0);

            info!("Titlebar GL renderer initialized ({}x{})", width, height);

            Ok(Self {
                program,
                vao,
                vbo,
                uniforms: Uniforms::locate(program),
                white_texture,
                textures: HashSet::new(),
                viewport: (width as f32, height as f32),
            })
        }
    }

    /// Track a resized output.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width as f32, height as f32);
    }

    fn create_shader_program() -> Result<u32> {
        unsafe {
            let vs = Self::compile_shader(VERTEX_SHADER, gl::VERTEX_SHADER)?;
            let fs = Self::compile_shader(FRAGMENT_SHADER, gl::FRAGMENT_SHADER)?;
            let program = Self::link_program(vs, fs);

            gl::DeleteShader(vs);
            gl::DeleteShader(fs);

            program
        }
    }

    unsafe fn compile_shader(source: &str, shader_type: u32) -> Result<u32> {
        let c_str = CString::new(source).context("Shader source contains a NUL byte")?;
        unsafe {
            let shader = gl::CreateShader(shader_type);
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
            gl::CompileShader(shader);

            let mut success = 0;
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut success);
            if success == 0 {
                let mut len = 0;
                gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len);
                let mut buffer = vec![0u8; len.max(0) as usize];
                gl::GetShaderInfoLog(shader, len, ptr::null_mut(), buffer.as_mut_ptr() as *mut _);
                gl::DeleteShader(shader);
                bail!("Shader compilation failed: {}", String::from_utf8_lossy(&buffer));
            }

            Ok(shader)
        }
    }

    unsafe fn link_program(vs: u32, fs: u32) -> Result<u32> {
        unsafe {
            let program = gl::CreateProgram();
            gl::AttachShader(program, vs);
            gl::AttachShader(program, fs);
            gl::LinkProgram(program);

            let mut success = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut success);
            if success == 0 {
                let mut len = 0;
                gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
                let mut buffer = vec![0u8; len.max(0) as usize];
                gl::GetProgramInfoLog(program, len, ptr::null_mut(), buffer.as_mut_ptr() as *mut _);
                gl::DeleteProgram(program);
                bail!("Program linking failed: {}", String::from_utf8_lossy(&buffer));
            }

            Ok(program)
        }
    }

    /// Draw one quad covering `rect` (device pixels, top-left origin).
    fn draw_quad(&self, rect: &Rect, texture: u32, color: [f32; 4], opacity: f32, radius: f32) {
        let (screen_width, screen_height) = self.viewport;

        // Convert top-left origin to OpenGL normalized coordinates
        let x_gl = (rect.x as f32 / screen_width) * 2.0 - 1.0;
        let y_gl = 1.0 - ((rect.y + rect.height) as f32 / screen_height) * 2.0;
        let width_gl = (rect.width as f32 / screen_width) * 2.0;
        let height_gl = (rect.height as f32 / screen_height) * 2.0;

        unsafe {
            gl::UseProgram(self.program);
            gl::Uniform2f(self.uniforms.position, x_gl, y_gl);
            gl::Uniform2f(self.uniforms.size, width_gl, height_gl);
            gl::Uniform4f(self.uniforms.color, color[0], color[1], color[2], color[3]);
            gl::Uniform1f(self.uniforms.opacity, opacity);
            gl::Uniform2f(self.uniforms.rect_size, rect.width as f32, rect.height as f32);
            gl::Uniform1f(self.uniforms.radius, radius);
            gl::Uniform1i(self.uniforms.texture, 0);

            gl::Enable(gl::BLEND);
            gl::BlendFunc(gl::ONE, gl::ONE_MINUS_SRC_ALPHA);

            gl::ActiveTexture(gl::TEXTURE0);
            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::BindVertexArray(self.vao);
            gl::DrawArrays(gl::TRIANGLE_FAN, 0, 4);
            gl::BindVertexArray(0);
            gl::BindTexture(gl::TEXTURE_2D, 0);

            let err = gl::GetError();
            if err != gl::NO_ERROR {
                warn!("OpenGL error after drawing titlebar quad: 0x{:x}", err);
            }
        }
    }
}

impl Renderer for GlRenderer {
    fn upload_texture(&mut self, pixels: &PixelBuffer) -> Result<TextureId> {
        // textures are always RGBA on the GPU
        let converted;
        let pixels = if pixels.format() == PixelFormat::Rgba8 {
            pixels
        } else {
            converted = pixels.clone().into_format(PixelFormat::Rgba8);
            &converted
        };

        unsafe {
            let mut texture = 0;
            gl::GenTextures(1, &mut texture);
            if texture == 0 {
                bail!("glGenTextures returned no texture name");
            }

            gl::BindTexture(gl::TEXTURE_2D, texture);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::NEAREST as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::NEAREST as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                pixels.width() as i32,
                pixels.height() as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixels.data().as_ptr() as *const _,
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);

            trace!("Uploaded {}x{} texture {}", pixels.width(), pixels.height(), texture);
            self.textures.insert(texture);
            Ok(TextureId(texture))
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture.0) {
            unsafe {
                gl::DeleteTextures(1, &texture.0);
            }
        } else {
            warn!("Destroying unknown texture {:?}", texture);
        }
    }

    fn render_texture(&mut self, texture: TextureId, target: &Rect, alpha: f32) {
        if !self.textures.contains(&texture.0) {
            warn!("render_texture called with unknown texture {:?}", texture);
            return;
        }
        self.draw_quad(target, texture.0, [1.0; 4], alpha, 0.0);
    }

    fn render_rect(&mut self, rect: &Rect, color: Color, radius: f32) {
        self.draw_quad(rect, self.white_texture, color.premultiplied(), 1.0, radius);
    }

    fn scissor(&mut self, rect: Option<&Rect>) {
        unsafe {
            match rect {
                Some(rect) => {
                    gl::Enable(gl::SCISSOR_TEST);
                    // GL scissor origin is bottom-left
                    let y = self.viewport.1 as i32 - rect.bottom();
                    gl::Scissor(rect.x, y, rect.width.max(0), rect.height.max(0));
                }
                None => gl::Disable(gl::SCISSOR_TEST),
            }
        }
    }

    fn push_stencil_exclusion(&mut self, shape: &Rect, radius: f32) {
        unsafe {
            gl::ClearStencil(0);
            gl::Clear(gl::STENCIL_BUFFER_BIT);
            gl::Enable(gl::STENCIL_TEST);

            gl::StencilFunc(gl::ALWAYS, 1, 0xFF);
            gl::StencilOp(gl::KEEP, gl::KEEP, gl::REPLACE);
            gl::ColorMask(gl::FALSE, gl::FALSE, gl::FALSE, gl::FALSE);
        }

        self.draw_quad(shape, self.white_texture, [1.0; 4], 1.0, radius);

        unsafe {
            gl::ColorMask(gl::TRUE, gl::TRUE, gl::TRUE, gl::TRUE);
            gl::StencilFunc(gl::NOTEQUAL, 1, 0xFF);
            gl::StencilOp(gl::KEEP, gl::KEEP, gl::REPLACE);
        }
    }

    fn clear_stencil(&mut self) {
        unsafe {
            gl::ClearStencil(0);
            gl::Clear(gl::STENCIL_BUFFER_BIT);
            gl::Disable(gl::STENCIL_TEST);
            gl::StencilMask(0xFF);
            gl::StencilFunc(gl::ALWAYS, 1, 0xFF);
        }
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        unsafe {
            for texture in self.textures.drain() {
                gl::DeleteTextures(1, &texture);
            }
            gl::DeleteTextures(1, &self.white_texture);
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteVertexArrays(1, &self.vao);
            gl::DeleteProgram(self.program);
        }
    }
}
