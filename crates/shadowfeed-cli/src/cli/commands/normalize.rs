//! `shadowfeed normalize` – show what the pipeline would key a URL as.

use shadowfeed_core::url_model::normalize;

pub fn run_normalize(urls: &[String]) {
    for url in urls {
        match normalize(url) {
            Some(key) => println!("{}\t{}", url, key),
            None => println!("{}\tfiltered", url),
        }
    }
}
