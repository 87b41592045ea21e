mod test_accumulator;
mod test_quantizer;
mod test_resampler;
mod test_wav_header;
