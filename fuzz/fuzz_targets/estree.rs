#![no_main]

use jsdeob::{
    ast::Program,
    codegen::{generate, GeneratorConfig},
    deobfuscation::{DeobfuscationEngine, EngineConfig},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut program) = Program::from_json(json) else {
        return;
    };
    let mut engine = DeobfuscationEngine::new(EngineConfig::aggressive());
    if engine.process_program(&mut program).is_ok() {
        let _ = generate(&program, &GeneratorConfig::default());
        let _ = program.to_json();
    }
});
