use std::env;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as Base64;

fn mime_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

fn main() {
    dotenvy::dotenv().ok();

    let proxy_url = env::var("PROXY_URL")
        .unwrap_or_else(|_| "http://localhost:8888/generate-image".to_string());
    let output_path = env::var("OUTPUT_PATH").unwrap_or_else(|_| "generated.png".to_string());

    let mut args = env::args().skip(1);
    let Some(image_path) = args.next() else {
        eprintln!("usage: send_image <image-file> [prompt...]");
        std::process::exit(2);
    };
    let prompt = args.collect::<Vec<_>>().join(" ");
    let prompt = if prompt.is_empty() {
        "Turn this picture into a watercolor painting".to_string()
    } else {
        prompt
    };

    let image_path = Path::new(&image_path);
    let image_bytes = match std::fs::read(image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Failed to read {}: {}", image_path.display(), e);
            std::process::exit(1);
        }
    };
    let mime_type = mime_type_for(image_path);

    println!("Sending image to proxy...");
    println!("  Proxy: {}", proxy_url);
    println!("  Image: {} ({}, {} bytes)", image_path.display(), mime_type, image_bytes.len());
    println!("  Prompt: {}", prompt);
    println!();

    let body = serde_json::json!({
        "prompt": prompt,
        "mimeType": mime_type,
        "imageData": Base64.encode(&image_bytes),
    });

    let resp = reqwest::blocking::Client::new()
        .post(&proxy_url)
        .json(&body)
        .send();

    match resp {
        Ok(r) => {
            let status = r.status();
            let body = r.text().unwrap_or_default();

            if !status.is_success() {
                println!("ERROR ({})", status);
                println!("{}", body);
                std::process::exit(1);
            }

            let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
            let Some(image_data) = json["imageData"].as_str() else {
                println!("OK ({}) but no imageData in response", status);
                println!("{}", body);
                std::process::exit(1);
            };
            let decoded = match Base64.decode(image_data) {
                Ok(decoded) => decoded,
                Err(e) => {
                    eprintln!("imageData is not valid base64: {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = std::fs::write(&output_path, &decoded) {
                eprintln!("Failed to write {}: {}", output_path, e);
                std::process::exit(1);
            }
            println!("OK ({})", status);
            println!("  Wrote {} bytes to {}", decoded.len(), output_path);
        }
        Err(e) => {
            eprintln!("Request failed — is the proxy running?");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_type_follows_extension() {
        assert_eq!(mime_type_for(Path::new("cat.PNG")), "image/png");
        assert_eq!(mime_type_for(Path::new("cat.jpeg")), "image/jpeg");
        assert_eq!(mime_type_for(Path::new("cat.webp")), "image/webp");
        assert_eq!(mime_type_for(Path::new("cat")), "application/octet-stream");
    }
}
