//! Shared functionality which is used in unit- and integration-tests
//!
//! Provides a small builder for crafting syntactically valid ELF images of either
//! class and byte order, so tests can exercise the parser, loader and embedder
//! without shipping binary fixtures. The builder lays the file out as
//! `ehdr | phdr table | shdr table | payloads` and assigns file offsets
//! automatically.

use crate::elf::ident::{ByteOrder, Class};

struct SegmentSpec {
    loadable: bool,
    paddr: u64,
    memsz: u64,
    data: Vec<u8>,
}

struct SectionSpec {
    sh_type: u32,
    link: u32,
    data: Vec<u8>,
}

/// Builder for crafted ELF images.
pub(crate) struct ImageBuilder {
    class: Class,
    order: ByteOrder,
    segments: Vec<SegmentSpec>,
    sections: Vec<SectionSpec>,
}

impl ImageBuilder {
    pub(crate) fn new(class: Class, order: ByteOrder) -> ImageBuilder {
        ImageBuilder {
            class,
            order,
            segments: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Add a loadable segment; `filesz` is the payload length.
    pub(crate) fn segment(mut self, paddr: u64, memsz: u64, data: Vec<u8>) -> ImageBuilder {
        self.segments.push(SegmentSpec {
            loadable: true,
            paddr,
            memsz,
            data,
        });
        self
    }

    /// Add a program header entry the loader must skip (a note segment).
    pub(crate) fn non_loadable(mut self, data: Vec<u8>) -> ImageBuilder {
        let memsz = data.len() as u64;
        self.segments.push(SegmentSpec {
            loadable: false,
            paddr: 0,
            memsz,
            data,
        });
        self
    }

    /// Add a section with the given type tag and `sh_link` value. Sections are
    /// indexed in insertion order, starting at 0.
    pub(crate) fn section(mut self, sh_type: u32, link: u32, data: Vec<u8>) -> ImageBuilder {
        self.sections.push(SectionSpec {
            sh_type,
            link,
            data,
        });
        self
    }

    fn push_half(&self, out: &mut Vec<u8>, value: u16) {
        match self.order {
            ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn push_word32(&self, out: &mut Vec<u8>, value: u32) {
        match self.order {
            ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
            ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    /// Emit a natural-word field: 4 bytes for ELF32, 8 for ELF64.
    fn push_word(&self, out: &mut Vec<u8>, value: u64) {
        match self.class {
            Class::Elf32 => self.push_word32(out, value as u32),
            Class::Elf64 => match self.order {
                ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
                ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
            },
        }
    }

    fn emit_ehdr(&self, phoff: u64, shoff: u64, shnum: u16) -> Vec<u8> {
        let (ehsize, phentsize, shentsize, class_byte, machine) = match self.class {
            Class::Elf32 => (52u16, 32u16, 40u16, 1u8, 3u16),
            Class::Elf64 => (64u16, 56u16, 64u16, 2u8, 62u16),
        };
        let order_byte = match self.order {
            ByteOrder::Little => 1u8,
            ByteOrder::Big => 2u8,
        };

        let mut ehdr = vec![0x7f, b'E', b'L', b'F', class_byte, order_byte, 1];
        ehdr.resize(16, 0);

        self.push_half(&mut ehdr, 2); // e_type = ET_EXEC
        self.push_half(&mut ehdr, machine);
        self.push_word32(&mut ehdr, 1); // e_version
        self.push_word(&mut ehdr, 0); // e_entry
        self.push_word(&mut ehdr, phoff);
        self.push_word(&mut ehdr, shoff);
        self.push_word32(&mut ehdr, 0); // e_flags
        self.push_half(&mut ehdr, ehsize);
        self.push_half(&mut ehdr, phentsize);
        self.push_half(&mut ehdr, self.segments.len() as u16);
        self.push_half(&mut ehdr, shentsize);
        self.push_half(&mut ehdr, shnum);
        self.push_half(&mut ehdr, shnum); // e_shstrndx out of range: no section names

        assert_eq!(ehdr.len(), usize::from(ehsize));
        ehdr
    }

    fn emit_phdr(&self, spec: &SegmentSpec, offset: u64) -> Vec<u8> {
        let p_type = if spec.loadable { 1u32 } else { 4u32 };
        let filesz = spec.data.len() as u64;

        let mut phdr = Vec::new();
        match self.class {
            Class::Elf32 => {
                self.push_word32(&mut phdr, p_type);
                self.push_word(&mut phdr, offset);
                self.push_word(&mut phdr, spec.paddr); // p_vaddr
                self.push_word(&mut phdr, spec.paddr);
                self.push_word(&mut phdr, filesz);
                self.push_word(&mut phdr, spec.memsz);
                self.push_word32(&mut phdr, 5); // p_flags = R+X
                self.push_word(&mut phdr, 0); // p_align
            }
            Class::Elf64 => {
                self.push_word32(&mut phdr, p_type);
                self.push_word32(&mut phdr, 5); // p_flags = R+X
                self.push_word(&mut phdr, offset);
                self.push_word(&mut phdr, spec.paddr); // p_vaddr
                self.push_word(&mut phdr, spec.paddr);
                self.push_word(&mut phdr, filesz);
                self.push_word(&mut phdr, spec.memsz);
                self.push_word(&mut phdr, 0); // p_align
            }
        }
        phdr
    }

    fn emit_shdr(&self, spec: &SectionSpec, offset: u64) -> Vec<u8> {
        let mut shdr = Vec::new();
        self.push_word32(&mut shdr, 0); // sh_name
        self.push_word32(&mut shdr, spec.sh_type);
        self.push_word(&mut shdr, 0); // sh_flags
        self.push_word(&mut shdr, 0); // sh_addr
        self.push_word(&mut shdr, offset);
        self.push_word(&mut shdr, spec.data.len() as u64);
        self.push_word32(&mut shdr, spec.link);
        self.push_word32(&mut shdr, 0); // sh_info
        self.push_word(&mut shdr, 0); // sh_addralign
        self.push_word(&mut shdr, 0); // sh_entsize
        shdr
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let (ehsize, phentsize, shentsize) = match self.class {
            Class::Elf32 => (52usize, 32usize, 40usize),
            Class::Elf64 => (64usize, 56usize, 64usize),
        };

        let phoff = if self.segments.is_empty() { 0 } else { ehsize };
        let shoff = if self.sections.is_empty() {
            0
        } else {
            ehsize + self.segments.len() * phentsize
        };

        let mut cursor =
            ehsize + self.segments.len() * phentsize + self.sections.len() * shentsize;

        let segment_offsets: Vec<usize> = self
            .segments
            .iter()
            .map(|spec| {
                let offset = cursor;
                cursor += spec.data.len();
                offset
            })
            .collect();
        let section_offsets: Vec<usize> = self
            .sections
            .iter()
            .map(|spec| {
                let offset = cursor;
                cursor += spec.data.len();
                offset
            })
            .collect();

        let mut image = vec![0u8; cursor];

        let ehdr = self.emit_ehdr(phoff as u64, shoff as u64, self.sections.len() as u16);
        image[..ehdr.len()].copy_from_slice(&ehdr);

        for (index, (spec, offset)) in self.segments.iter().zip(&segment_offsets).enumerate() {
            let phdr = self.emit_phdr(spec, *offset as u64);
            let at = phoff + index * phentsize;
            image[at..at + phdr.len()].copy_from_slice(&phdr);
            image[*offset..*offset + spec.data.len()].copy_from_slice(&spec.data);
        }

        for (index, (spec, offset)) in self.sections.iter().zip(&section_offsets).enumerate() {
            let shdr = self.emit_shdr(spec, *offset as u64);
            let at = shoff + index * shentsize;
            image[at..at + shdr.len()].copy_from_slice(&shdr);
            image[*offset..*offset + spec.data.len()].copy_from_slice(&spec.data);
        }

        image
    }
}

/// Emit a symbol table section and its string table for the given
/// name/value pairs.
pub(crate) fn symbols_sections(
    class: Class,
    order: ByteOrder,
    symbols: &[(&str, u64)],
) -> (Vec<u8>, Vec<u8>) {
    let push_half = |out: &mut Vec<u8>, value: u16| match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    };
    let push_word32 = |out: &mut Vec<u8>, value: u32| match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    };
    let push_word64 = |out: &mut Vec<u8>, value: u64| match order {
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()),
    };

    let mut strtab = vec![0u8];
    let mut symtab = Vec::new();

    for (name, value) in symbols {
        let name_offset = strtab.len() as u32;
        strtab.extend_from_slice(name.as_bytes());
        strtab.push(0);

        match class {
            Class::Elf32 => {
                push_word32(&mut symtab, name_offset);
                push_word32(&mut symtab, *value as u32); // st_value
                push_word32(&mut symtab, 0); // st_size
                symtab.push(0); // st_info
                symtab.push(0); // st_other
                push_half(&mut symtab, 0); // st_shndx
            }
            Class::Elf64 => {
                push_word32(&mut symtab, name_offset);
                symtab.push(0); // st_info
                symtab.push(0); // st_other
                push_half(&mut symtab, 0); // st_shndx
                push_word64(&mut symtab, *value); // st_value
                push_word64(&mut symtab, 0); // st_size
            }
        }
    }

    (symtab, strtab)
}
