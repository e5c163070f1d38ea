use std::time::Instant;

pub struct ProgressIndicator {
    total: usize,
    converted: usize,
    skipped: usize,
    failed: usize,
    start_time: Instant,
}

impl ProgressIndicator {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            converted: 0,
            skipped: 0,
            failed: 0,
            start_time: Instant::now(),
        }
    }

    pub fn start_item(&self, name: &str) {
        println!(
            "Processing: {} ({}/{})",
            name,
            self.converted + self.skipped + self.failed + 1,
            self.total
        );
    }

    pub fn skip_item(&mut self, _name: &str) {
        self.skipped += 1;
    }

    pub fn complete_item(&mut self, _name: &str, success: bool) {
        if success {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn finish(&self) {
        let elapsed = self.start_time.elapsed();
        println!("\n{}", "=".repeat(60));
        println!("Summary:");
        println!("  Total:     {}", self.total);
        println!("  Converted: {}", self.converted);
        println!("  Skipped:   {}", self.skipped);
        println!("  Failed:    {}", self.failed);
        println!("  Duration:  {:.2}s", elapsed.as_secs_f64());
        println!("{}", "=".repeat(60));
    }
}
