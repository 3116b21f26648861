use odb_scrapers::DevotionalService;

pub struct AppState {
    pub service: DevotionalService,
}

impl AppState {
    pub fn new(service: DevotionalService) -> Self {
        Self { service }
    }
}
