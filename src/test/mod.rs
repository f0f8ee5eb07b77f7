mod buffer;
mod echo;
mod engine;
mod event_queue;
