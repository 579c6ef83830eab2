
mod create;
mod delete;
mod iterate;
mod log;
mod validate;
