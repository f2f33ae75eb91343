use log::{debug, info};
use tracereplay_core::gpu::{
  Barrier,
  BarrierAccess,
  BarrierSync,
  BindingTable,
  ClearColor,
  CommandBuffer,
  CommandPool,
  GPUBackend,
  Queue,
  RayGenerationShader,
  Submission,
  Swapchain,
  ViewConstants
};

use crate::camera::Camera;
use crate::graphics::RenderContext;
use crate::loader::{LoadState, SceneLoader};

use super::{FrameTimer, RenderSettings};

pub const PLACEHOLDER_CLEAR_COLOR: ClearColor = ClearColor([0.8f32, 1.0f32, 0.8f32, 1.0f32]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
  pub frame: u64,
  /// Whether the readiness flag was observed before the frame was recorded.
  pub scene_ready: bool,
  pub backbuffer_index: u32
}

/// Presents the placeholder until the scene loader publishes readiness, then traces the
/// loaded scene every frame.
pub struct Renderer<B: GPUBackend> {
  context: RenderContext<B>,
  loader: SceneLoader<B>,
  settings: RenderSettings,
  camera: Option<Camera>,
  _command_pool: B::CommandPool,
  command_buffer: B::CommandBuffer,
  frame: u64,
  timer: FrameTimer
}

impl<B: GPUBackend> Renderer<B> {
  pub fn new(context: RenderContext<B>, loader: SceneLoader<B>, settings: RenderSettings) -> Self {
    let mut command_pool = unsafe { context.queue().create_command_pool() };
    let command_buffer = unsafe { command_pool.create_command_buffer() };
    Self {
      context,
      loader,
      settings: settings.clamped(),
      camera: None,
      _command_pool: command_pool,
      command_buffer,
      frame: 0,
      timer: FrameTimer::new()
    }
  }

  pub fn loader(&self) -> &SceneLoader<B> {
    &self.loader
  }

  pub fn load_state(&self) -> LoadState {
    self.loader.state()
  }

  pub fn context(&self) -> &RenderContext<B> {
    &self.context
  }

  pub fn settings(&self) -> &RenderSettings {
    &self.settings
  }

  pub fn camera(&self) -> Option<&Camera> {
    self.camera.as_ref()
  }

  pub fn frame_timer(&self) -> &FrameTimer {
    &self.timer
  }

  pub fn render(&mut self) -> FrameInfo {
    self.frame += 1;
    self.poll_scene();

    let backbuffer_index = self.context.frame_sync().backbuffer_index();
    let scene_ready = self.context.scene().is_some();

    unsafe {
      self.command_buffer.reset(self.frame);
      self.command_buffer.begin(self.frame);
    }
    if scene_ready {
      self.record_trace(backbuffer_index);
    } else {
      unsafe {
        self.command_buffer.clear_backbuffer(self.context.swapchain(), backbuffer_index, PLACEHOLDER_CLEAR_COLOR);
      }
    }
    unsafe {
      self.command_buffer.finish();
    }

    {
      let mut command_buffers = [&mut self.command_buffer];
      let queue = self.context.queue();
      unsafe {
        queue.submit(&mut [Submission {
          command_buffers: &mut command_buffers,
          wait_fences: &[],
          signal_fences: &[]
        }]);
        queue.present(self.context.swapchain());
      }
    }
    self.context.end_frame();

    if let Some(average) = self.timer.tick() {
      debug!("Frame time: {:?}, {:.1} fps", average, self.timer.fps().unwrap_or(0.0));
    }

    FrameInfo {
      frame: self.frame,
      scene_ready,
      backbuffer_index
    }
  }

  fn poll_scene(&mut self) {
    if self.context.scene().is_some() || !self.loader.is_ready() {
      return;
    }
    if let Some(loaded) = self.loader.take_scene() {
      let swapchain = self.context.swapchain();
      self.camera = Some(loaded.camera.with_aspect_ratio(swapchain.width(), swapchain.height()));
      info!(
        "Installing scene with {} vertices and {} instances",
        loaded.resources.vertex_count(),
        loaded.resources.instance_count()
      );
      self.context.install_scene(loaded.resources);
    }
  }

  fn record_trace(&mut self, backbuffer_index: u32) {
    let camera = self.camera.unwrap_or_else(Camera::trace_default);
    let constants = ViewConstants {
      inverse_view: camera.inverse_view_matrix(),
      inverse_projection: camera.inverse_projection_matrix(),
      invert_y: camera.invert_y || self.settings.invert_y,
      ao_samples: self.settings.ao_samples
    };

    let swapchain = self.context.swapchain();
    let binding_table = self.context.binding_table();
    let (width, height) = (swapchain.width(), swapchain.height());
    unsafe {
      binding_table.set_view_constants(&constants);
      if self.settings.ambient_occlusion {
        self.command_buffer.trace_ray(binding_table, RayGenerationShader::AmbientOcclusionHitPositions, width, height, 1);
        self.command_buffer.barrier(&[Barrier::GlobalBarrier {
          old_sync: BarrierSync::RAY_TRACING,
          new_sync: BarrierSync::RAY_TRACING,
          old_access: BarrierAccess::STORAGE_WRITE,
          new_access: BarrierAccess::STORAGE_READ
        }]);
        self.command_buffer.trace_ray(binding_table, RayGenerationShader::AmbientOcclusion, width, height, 1);
      } else {
        self.command_buffer.trace_ray(binding_table, RayGenerationShader::Primary, width, height, 1);
      }
      self.command_buffer.barrier(&[Barrier::GlobalBarrier {
        old_sync: BarrierSync::RAY_TRACING,
        new_sync: BarrierSync::COPY,
        old_access: BarrierAccess::STORAGE_WRITE,
        new_access: BarrierAccess::COPY_READ
      }]);
      self.command_buffer.copy_output_to_backbuffer(swapchain, backbuffer_index);
    }
  }
}
