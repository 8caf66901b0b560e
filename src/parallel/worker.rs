//! Worker thread
//!
//! Each worker pulls one unit of work at a time, runs the engine over it,
//! and forwards the result. Workers are independent: a failed batch comes
//! back from the engine as a result full of error lines, so nothing a batch
//! does can take down its worker or its siblings.

use crossbeam_channel::{Receiver, Sender};

use crate::engine::Engine;

use super::types::{ResultMessage, Work};

pub(crate) fn worker_thread(
    _worker_id: usize,
    work_receiver: Receiver<Work>,
    result_sender: Sender<ResultMessage>,
    engine: Engine,
) {
    loop {
        match work_receiver.recv() {
            Ok(Work::Batch(batch)) => {
                let result = engine.process_batch(&batch);
                if result_sender
                    .send(ResultMessage::Completed(result))
                    .is_err()
                {
                    break;
                }
            }
            // Explicit stop signal, or the chunker is gone.
            Ok(Work::Stop) | Err(_) => break,
        }
    }
}
