use streaming::{Completion, CompletionSender, FetchError, FetchRequest, TileFetcher};

use crate::surface::TileImage;

/// Square test tile tagged with the identifier it came from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestImage {
    pub name: String,
    pub size: u32,
}

impl TestImage {
    pub fn new(name: &str, size: u32) -> Self {
        Self {
            name: name.to_owned(),
            size,
        }
    }
}

impl TileImage for TestImage {
    fn width(&self) -> u32 {
        self.size
    }

    fn height(&self) -> u32 {
        self.size
    }
}

/// Answers every fetch immediately through the completion channel.
pub(crate) struct MemoryFetcher {
    pub fetched: Vec<String>,
    serve: fn(&str) -> Result<TestImage, FetchError>,
}

impl MemoryFetcher {
    pub fn new(serve: fn(&str) -> Result<TestImage, FetchError>) -> Self {
        Self {
            fetched: Vec::new(),
            serve,
        }
    }

    /// Serves 512 px tiles for every identifier, 1728 px for allsky atlases.
    pub fn serving_everything() -> Self {
        Self::new(|id| {
            let size = if id.contains("Allsky") { 1728 } else { 512 };
            Ok(TestImage::new(id, size))
        })
    }
}

impl TileFetcher for MemoryFetcher {
    type Image = TestImage;

    fn fetch(&mut self, request: FetchRequest, done: CompletionSender<TestImage>) {
        self.fetched.push(request.identifier.clone());
        let result = (self.serve)(&request.identifier);
        // The receiver lives as long as the scheduler that called us.
        let _ = done.send(Completion::for_request(&request, result));
    }
}
