//! Example: Signing an attestation, attaching an offline receipt and verifying
//!
//! Run with: cargo run --example sign_and_verify

use p256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use scitt_core::{
    artifact_basename, assemble, Bundle, BundleLinks, Es256Signer, ReceiptProvider,
    StatementBuilder, StatementVerifier,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("SCITT Attestation Statements - Example Usage\n");
    println!("==============================================\n");

    // Step 1: Issuer key (in production, loaded from a PEM file or HSM)
    println!("1️⃣  Generating issuer signing key...");
    let signer = Es256Signer::new(SigningKey::random(&mut OsRng));
    let verifier = signer.verifier();
    println!("{}", signer.public_key_pem()?);

    // Step 2: Attestation document
    println!("2️⃣  Preparing attestation...");
    let attestation = json!({
        "id": "urn:dbom:att/2025-10-11/001",
        "subject": {"model": "humanoid-h1", "serial": "H1-0042"},
        "claims": {"firmware": "2.5.1", "safety_cert": "ISO-10218"},
        "issued_at": "2025-10-11T09:30:00Z"
    });
    println!("   ✓ Attestation id: {}\n", attestation["id"]);

    // Step 3: Canonicalize and sign
    println!("3️⃣  Building signed statement...");
    let builder = StatementBuilder::new(signer, "did:example:issuer#keys-1");
    let statement = builder.build(&attestation)?;
    println!("   ✓ Key id: {}", statement.protected.kid);
    println!("   ✓ Payload sha256: {}", statement.payload_digest()?);
    println!("   ✓ Signature: {}...\n", &statement.signature[..16]);

    // Step 4: Receipt (no log configured, so synthesized offline)
    println!("4️⃣  Obtaining receipt...");
    let receipt = ReceiptProvider::offline().obtain(&statement).await?;
    println!("   ✓ Entry id: {}", receipt.entry_id().unwrap_or("-"));
    println!("   ✓ Root hash: {}\n", receipt.root_hash().unwrap_or("-"));

    // Step 5: Bundle
    println!("5️⃣  Assembling bundle...");
    let links = BundleLinks::standard(
        "https://canon.example/entries/17",
        "",
        "dbom/H1-0042.json",
    );
    let bundle = assemble(statement, receipt, links);
    let text = bundle.to_pretty_json()?;
    println!("   ✓ Basename: {}", artifact_basename(&attestation));
    println!("   ✓ Bundle size: {} bytes\n", text.len());

    // Step 6: Verify as a relying party would
    println!("6️⃣  Verifying bundle...");
    let parsed = Bundle::from_json(&text)?;
    let verifier = StatementVerifier::new(verifier);
    match verifier.verify_bundle(&parsed)? {
        true => println!("   ✅ Signature VALID\n"),
        false => println!("   ❌ Signature INVALID\n"),
    }

    // Step 7: Tamper with the payload
    println!("7️⃣  Tampering with the payload...");
    let mut tampered = parsed.statement.clone();
    tampered.payload = tampered.payload.replacen('e', "f", 1);
    println!("   ✓ Tampered statement verifies: {}\n", verifier.verify(&tampered)?);

    println!("==============================================");
    println!("✅ Statement workflow complete!");
    println!("\nNext steps:");
    println!("  - Set SCITT_LOG_URL to register statements with a transparency log");
    println!("  - Distribute the issuer public key: scitt pubkey --issuer-key issuer.pem");
    println!("  - Verifiers run: scitt verify <bundle> <public-key>");
    Ok(())
}
