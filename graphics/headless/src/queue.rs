use std::io::Result as IOResult;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::trace;
use tracereplay_core::gpu::{Queue, Submission};

use crate::command::RecordedCommand;
use crate::swapchain::SwapchainInner;
use crate::sync::FenceInner;
use crate::*;

pub(crate) enum QueueItem {
    Execute(Vec<RecordedCommand>),
    Wait { fence: Arc<FenceInner>, value: u64 },
    Signal { fence: Arc<FenceInner>, value: u64 },
    Present(Arc<SwapchainInner>),
}

/// The queue owns the timeline thread. Items run strictly in the order they were sent.
pub struct HeadlessQueue {
    sender: Option<Sender<QueueItem>>,
    thread: Option<JoinHandle<()>>,
    shared: Arc<HeadlessShared>,
}

impl HeadlessQueue {
    pub(crate) fn new(shared: &Arc<HeadlessShared>) -> IOResult<Self> {
        let (sender, receiver) = unbounded::<QueueItem>();
        let thread_shared = shared.clone();
        let thread = thread::Builder::new()
            .name("HeadlessQueue".to_string())
            .spawn(move || run_timeline(receiver, thread_shared))?;
        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
            shared: shared.clone(),
        })
    }

    pub(crate) fn send(&self, item: QueueItem) {
        let sent = self.sender.as_ref().map(|sender| sender.send(item).is_ok()).unwrap_or(false);
        if !sent {
            panic!("The headless queue thread has terminated.");
        }
    }

    fn check_top_level_builds(&self, commands: &[RecordedCommand]) {
        let mut all_bottom_levels_complete = true;
        for command in commands {
            match command {
                RecordedCommand::UploadInstances { instances, .. } => {
                    all_bottom_levels_complete &= instances.iter().all(|(blas, _)| blas.is_built());
                }
                RecordedCommand::BuildTopLevel { instances_count, .. } => {
                    self.shared.record(HeadlessEvent::TopLevelSubmitted {
                        instance_count: *instances_count,
                        all_bottom_levels_complete,
                    });
                }
                _ => {}
            }
        }
    }
}

impl Drop for HeadlessQueue {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run_timeline(receiver: Receiver<QueueItem>, shared: Arc<HeadlessShared>) {
    trace!("Headless queue thread started");
    for item in receiver.iter() {
        match item {
            QueueItem::Execute(commands) => {
                for command in commands {
                    command.execute(&shared);
                }
            }
            QueueItem::Wait { fence, value } => {
                fence.await_signal(value);
            }
            QueueItem::Signal { fence, value } => {
                fence.signal(value);
                shared.record(HeadlessEvent::FenceSignalled { value });
            }
            QueueItem::Present(swapchain) => {
                let backbuffer_index = swapchain.present();
                shared.record(HeadlessEvent::Present { backbuffer_index });
            }
        }
    }
    trace!("Headless queue thread stopped");
}

impl Queue<HeadlessBackend> for HeadlessQueue {
    unsafe fn create_command_pool(&self) -> HeadlessCommandPool {
        HeadlessCommandPool {}
    }

    unsafe fn submit(&self, submissions: &mut [Submission<HeadlessBackend>]) {
        for submission in submissions.iter_mut() {
            for wait in submission.wait_fences {
                self.send(QueueItem::Wait {
                    fence: wait.fence.inner().clone(),
                    value: wait.value,
                });
            }
            for command_buffer in submission.command_buffers.iter_mut() {
                let commands = command_buffer.take_commands();
                self.check_top_level_builds(&commands);
                self.send(QueueItem::Execute(commands));
            }
            for signal in submission.signal_fences {
                self.send(QueueItem::Signal {
                    fence: signal.fence.inner().clone(),
                    value: signal.value,
                });
            }
        }
    }

    unsafe fn present(&self, swapchain: &HeadlessSwapchain) {
        self.send(QueueItem::Present(swapchain.inner().clone()));
    }
}
