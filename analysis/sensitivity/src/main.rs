//! 队列敏感性研究入口.

mod result;
mod runner;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .expect("Logger init error");

    let result = runner::run();
    result.analyze();
}
